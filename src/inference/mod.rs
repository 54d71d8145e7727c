//! Boundary types shared with an external sampling engine.
//!
//! The crate evaluates joint log-densities and generates posterior-predictive
//! draws; the MCMC or HMC engine that proposes parameters lives elsewhere and
//! talks to the models through [`LogDensityModel`].

use thiserror::Error;

/// Errors raised while evaluating a proposed parameter set.
///
/// Recoverable variants signal "reject this proposal" to the external
/// sampler; the evaluation fails but the run continues. A dimension mismatch
/// instead indicates a misconfigured engine and is not recoverable.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    #[error("parameter block `{block}` has dimension {found}, model expects {expected}")]
    DimensionMismatch {
        block: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("proposed covariance is not positive definite")]
    CovarianceNotPositiveDefinite,
    #[error("joint log-density evaluated to NaN")]
    NonFiniteDensity,
}

impl EvalError {
    /// Whether the external sampler should treat this as a rejected proposal
    /// rather than a fatal configuration problem.
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        !matches!(self, Self::DimensionMismatch { .. })
    }
}

/// The seam between a model and the external sampling engine.
///
/// Implementations are pure: the same parameters always produce the same
/// density, no shared state is mutated, and concurrent evaluations from
/// independent chains are safe.
pub trait LogDensityModel {
    /// Raw parameter container proposed by the engine.
    type Parameters;

    /// Joint log-density of the observed data and all parameters.
    ///
    /// `Ok(f64::NEG_INFINITY)` is an in-band rejection for proposals outside
    /// the prior support.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] when the evaluation itself fails; see
    /// [`EvalError::is_recoverable`].
    fn log_density(&self, parameters: &Self::Parameters) -> Result<f64, EvalError>;

    /// Total number of scalar parameters the engine proposes per evaluation.
    fn parameter_dimension(&self) -> usize;
}
