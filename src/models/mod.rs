//! Model families for 5-point ordinal survey responses.

use thiserror::Error;

use crate::input::InputError;

pub mod mpt;
pub mod pcm;
pub mod posterior;
pub mod priors;
pub mod probability;

/// Errors raised while constructing a model.
///
/// Every variant is a configuration inconsistency: fatal before sampling
/// begins, never recoverable at the proposal level.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    InvalidInput(#[from] InputError),
    #[error("model requires at least one trait dimension")]
    NoTraitDimensions,
    #[error("item {item} loads on trait group {group}, but the model has {groups} trait groups")]
    TraitGroupOutOfRange {
        item: usize,
        group: usize,
        groups: usize,
    },
    #[error("prior trait mean has length {found}, latent dimension is {expected}")]
    TraitMeanDimensionMismatch { expected: usize, found: usize },
    #[error("a single latent dimension requires the scalar inverse-gamma covariance prior")]
    ScalarCovariancePriorRequired,
    #[error("{dims} latent dimensions require the inverse-Wishart covariance prior")]
    MatrixCovariancePriorRequired { dims: usize },
    #[error("covariance prior shape and scale must be positive")]
    InvalidCovariancePrior,
    #[error("inverse-Wishart scale must be {expected}x{expected}, found {rows}x{cols}")]
    CovarianceScaleDimensionMismatch {
        expected: usize,
        rows: usize,
        cols: usize,
    },
    #[error(
        "inverse-Wishart degrees of freedom ({df}) must be at least latent dimension + 1 ({min})"
    )]
    InsufficientDegreesOfFreedom { df: f64, min: f64 },
    #[error("inverse-Wishart scale matrix is not positive definite")]
    CovarianceScaleNotPositiveDefinite,
    #[error("item variance prior shape and scale must be positive")]
    InvalidItemVariancePrior,
    #[error("scaling bounds must satisfy 0 <= lower < upper")]
    InvalidScalingBounds,
}
