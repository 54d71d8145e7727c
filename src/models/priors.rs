//! Hierarchical prior configuration and log-density helpers shared by the
//! response-style and partial-credit families.
//!
//! Priors are evaluated, never sampled: the external engine proposes raw
//! parameters and the functions here score them. Proposals outside the prior
//! support score `f64::NEG_INFINITY`, which the engine reads as a rejection.

use faer::Mat;
use statrs::function::gamma::ln_gamma;

use crate::inference::EvalError;
use crate::models::ModelError;
use crate::utils::{
    cholesky_log_determinant, cholesky_lower, forward_substitute, matrix_inverse, trace_of_product,
    usize_to_f64,
};

/// Prior over the raw person covariance.
///
/// The inverse-Wishart density degenerates at dimension one, so a single
/// latent dimension must use the scalar inverse-gamma arm instead; model
/// construction enforces the match.
#[derive(Debug, Clone)]
pub enum CovariancePrior {
    /// Inverse-Wishart over an S x S covariance, S >= 2.
    InverseWishart {
        degrees_of_freedom: f64,
        scale: Mat<f64>,
    },
    /// Inverse-gamma over the scalar variance when S == 1.
    InverseGamma { shape: f64, scale: f64 },
}

/// Fixed hyperparameters for the shared hierarchy.
#[derive(Debug, Clone)]
pub struct PriorConfig {
    /// Anchoring mean for raw person trait vectors, length S. Typically zero.
    pub trait_mean: Vec<f64>,
    /// Prior over the raw person covariance.
    pub covariance: CovariancePrior,
    /// Shape for the inverse-gamma prior on raw item variances.
    pub item_variance_shape: f64,
    /// Scale for the inverse-gamma prior on raw item variances.
    pub item_variance_scale: f64,
    /// Lower bound of the implicit uniform prior on scaling parameters.
    pub scaling_lower: f64,
    /// Upper bound of the implicit uniform prior on scaling parameters.
    pub scaling_upper: f64,
}

impl PriorConfig {
    /// Default hierarchy for `latent_dimension` latent dimensions: zero trait
    /// mean, identity inverse-Wishart scale with `S + 1` degrees of freedom
    /// (inverse-gamma with shape and scale 1 when S == 1), item variances
    /// inverse-gamma(1, 1), scaling bounded on (0, 10].
    #[must_use]
    pub fn standard(latent_dimension: usize) -> Self {
        let covariance = if latent_dimension == 1 {
            CovariancePrior::InverseGamma {
                shape: 1.0,
                scale: 1.0,
            }
        } else {
            CovariancePrior::InverseWishart {
                degrees_of_freedom: usize_to_f64(latent_dimension) + 1.0,
                scale: crate::utils::identity_matrix(latent_dimension),
            }
        };
        Self {
            trait_mean: vec![0.0; latent_dimension],
            covariance,
            item_variance_shape: 1.0,
            item_variance_scale: 1.0,
            scaling_lower: 0.0,
            scaling_upper: 10.0,
        }
    }

    /// Check internal consistency against the model's latent dimension.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` describing the first inconsistency found.
    pub fn validate(&self, latent_dimension: usize) -> Result<(), ModelError> {
        if self.trait_mean.len() != latent_dimension {
            return Err(ModelError::TraitMeanDimensionMismatch {
                expected: latent_dimension,
                found: self.trait_mean.len(),
            });
        }
        if !(self.item_variance_shape > 0.0 && self.item_variance_scale > 0.0) {
            return Err(ModelError::InvalidItemVariancePrior);
        }
        if !(self.scaling_lower >= 0.0 && self.scaling_lower < self.scaling_upper) {
            return Err(ModelError::InvalidScalingBounds);
        }
        match &self.covariance {
            CovariancePrior::InverseGamma { shape, scale } => {
                if latent_dimension != 1 {
                    return Err(ModelError::MatrixCovariancePriorRequired {
                        dims: latent_dimension,
                    });
                }
                if !(*shape > 0.0 && *scale > 0.0) {
                    return Err(ModelError::InvalidCovariancePrior);
                }
            }
            CovariancePrior::InverseWishart {
                degrees_of_freedom,
                scale,
            } => {
                if latent_dimension == 1 {
                    return Err(ModelError::ScalarCovariancePriorRequired);
                }
                if scale.nrows() != latent_dimension || scale.ncols() != latent_dimension {
                    return Err(ModelError::CovarianceScaleDimensionMismatch {
                        expected: latent_dimension,
                        rows: scale.nrows(),
                        cols: scale.ncols(),
                    });
                }
                let min = usize_to_f64(latent_dimension) + 1.0;
                if *degrees_of_freedom < min {
                    return Err(ModelError::InsufficientDegreesOfFreedom {
                        df: *degrees_of_freedom,
                        min,
                    });
                }
                if cholesky_lower(scale).is_none() {
                    return Err(ModelError::CovarianceScaleNotPositiveDefinite);
                }
            }
        }
        Ok(())
    }
}

/// Log-density of `Normal(0, 1)`.
#[must_use]
pub fn log_standard_normal_density(value: f64) -> f64 {
    -0.5 * value.mul_add(value, std::f64::consts::TAU.ln())
}

/// Log-density of `Normal(mean, sd^2)`.
#[must_use]
pub fn log_normal_density(value: f64, mean: f64, sd: f64) -> f64 {
    if sd <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let standardized = (value - mean) / sd;
    -0.5 * standardized.mul_add(standardized, std::f64::consts::TAU.ln()) - sd.ln()
}

/// Log-density of an inverse-gamma distribution.
#[must_use]
pub fn log_inverse_gamma_density(value: f64, shape: f64, scale: f64) -> f64 {
    if !(value > 0.0 && shape > 0.0 && scale > 0.0) {
        return f64::NEG_INFINITY;
    }

    shape.mul_add(scale.ln(), -ln_gamma(shape)) - (shape + 1.0).mul_add(value.ln(), scale / value)
}

/// Indicator-only log-density of the implicit uniform prior on a bounded
/// interval: zero inside, negative infinity outside, no width normalizer.
#[must_use]
pub fn log_implicit_uniform(value: f64, lower: f64, upper: f64) -> f64 {
    if value > lower && value <= upper {
        0.0
    } else {
        f64::NEG_INFINITY
    }
}

/// `ln` of the multivariate gamma function of dimension `dimension`.
#[must_use]
pub fn ln_multivariate_gamma(dimension: usize, argument: f64) -> f64 {
    let mut total =
        usize_to_f64(dimension * (dimension - 1)) / 4.0 * std::f64::consts::PI.ln();
    for j in 0..dimension {
        total += ln_gamma(argument - usize_to_f64(j) / 2.0);
    }
    total
}

/// Log-density of `InverseWishart(degrees_of_freedom, scale)` at `value`.
///
/// # Errors
///
/// Returns a recoverable [`EvalError`] when `value` is not positive definite.
pub fn log_inverse_wishart_density(
    value: &Mat<f64>,
    degrees_of_freedom: f64,
    scale: &Mat<f64>,
) -> Result<f64, EvalError> {
    let dim = value.ncols();
    let value_chol =
        cholesky_lower(value).ok_or(EvalError::CovarianceNotPositiveDefinite)?;
    let value_inverse =
        matrix_inverse(value).ok_or(EvalError::CovarianceNotPositiveDefinite)?;
    let scale_chol =
        cholesky_lower(scale).ok_or(EvalError::CovarianceNotPositiveDefinite)?;

    let dim_f = usize_to_f64(dim);
    let log_det_value = cholesky_log_determinant(&value_chol);
    let log_det_scale = cholesky_log_determinant(&scale_chol);

    Ok(0.5 * degrees_of_freedom * log_det_scale
        - 0.5 * degrees_of_freedom * dim_f * std::f64::consts::LN_2
        - ln_multivariate_gamma(dim, 0.5 * degrees_of_freedom)
        - 0.5 * (degrees_of_freedom + dim_f + 1.0) * log_det_value
        - 0.5 * trace_of_product(scale, &value_inverse))
}

/// Log prior of the raw person covariance under the configured arm.
///
/// # Errors
///
/// Returns a recoverable [`EvalError`] for covariance proposals the density
/// cannot score.
pub fn covariance_log_prior(
    prior: &CovariancePrior,
    covariance_raw: &Mat<f64>,
) -> Result<f64, EvalError> {
    match prior {
        CovariancePrior::InverseWishart {
            degrees_of_freedom,
            scale,
        } => log_inverse_wishart_density(covariance_raw, *degrees_of_freedom, scale),
        CovariancePrior::InverseGamma { shape, scale } => Ok(log_inverse_gamma_density(
            covariance_raw[(0, 0)],
            *shape,
            *scale,
        )),
    }
}

/// Indicator log prior over the whole scaling vector.
#[must_use]
pub fn scaling_log_prior(scaling: &[f64], lower: f64, upper: f64) -> f64 {
    scaling
        .iter()
        .map(|&value| log_implicit_uniform(value, lower, upper))
        .sum()
}

/// Log prior of the item hierarchy: standard-normal means, inverse-gamma raw
/// variances, and normal deviations scored with the (trait group, process)
/// standard deviation. `trait_group` labels are 1-based.
#[must_use]
pub fn item_hierarchy_log_prior(
    item_means: &Mat<f64>,
    item_variances_raw: &Mat<f64>,
    beta_raw: &Mat<f64>,
    trait_group: &[usize],
    shape: f64,
    scale: f64,
) -> f64 {
    let mut total = 0.0;
    for group in 0..item_means.nrows() {
        for process in 0..item_means.ncols() {
            total += log_standard_normal_density(item_means[(group, process)]);
            total += log_inverse_gamma_density(item_variances_raw[(group, process)], shape, scale);
        }
    }
    for item in 0..beta_raw.nrows() {
        let group = trait_group[item] - 1;
        for process in 0..beta_raw.ncols() {
            let variance = item_variances_raw[(group, process)];
            let sd = if variance > 0.0 { variance.sqrt() } else { 0.0 };
            total += log_normal_density(beta_raw[(item, process)], 0.0, sd);
        }
    }
    total
}

/// Sum of multivariate-normal log-densities for every row of `theta_raw`
/// around `mean` with covariance `covariance_raw`. Degenerates to the
/// univariate normal at dimension one.
///
/// # Errors
///
/// Returns a recoverable [`EvalError`] when the covariance proposal is not
/// positive definite.
pub fn trait_vectors_log_prior(
    theta_raw: &Mat<f64>,
    mean: &[f64],
    covariance_raw: &Mat<f64>,
) -> Result<f64, EvalError> {
    let dim = mean.len();
    let lower = cholesky_lower(covariance_raw).ok_or(EvalError::CovarianceNotPositiveDefinite)?;
    let constant = -0.5
        * usize_to_f64(dim).mul_add(
            std::f64::consts::TAU.ln(),
            cholesky_log_determinant(&lower),
        );

    let mut total = 0.0;
    let mut centered = vec![0.0; dim];
    for person in 0..theta_raw.nrows() {
        for slot in 0..dim {
            centered[slot] = theta_raw[(person, slot)] - mean[slot];
        }
        let whitened = forward_substitute(&lower, &centered);
        let quadratic: f64 = whitened.iter().map(|value| value * value).sum();
        total += constant - 0.5 * quadratic;
    }
    Ok(total)
}
