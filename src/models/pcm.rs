//! Partial-credit model over ordered thresholds.
//!
//! The ordinal alternative to the processing-tree family: each item carries
//! four threshold parameters, cumulative trait-minus-threshold scores pass
//! through a stable softmax, and reverse-keyed items reverse the resulting
//! category order outright instead of flipping the trait comparison.

use faer::Mat;
use rand::rngs::StdRng;

use crate::inference::{EvalError, LogDensityModel};
use crate::input::SurveyInput;
use crate::models::ModelError;
use crate::models::posterior::PosteriorDraw;
use crate::models::priors::{
    PriorConfig, covariance_log_prior, item_hierarchy_log_prior, scaling_log_prior,
    trait_vectors_log_prior,
};
use crate::models::probability::{CATEGORIES, draw_category, log_category_probability};
use crate::utils::{correlation_from_covariance, identity_matrix};

/// Threshold parameters per item: one per adjacent category pair.
pub const THRESHOLD_COUNT: usize = CATEGORIES - 1;

/// Reverse a category distribution: 1 <-> 5, 2 <-> 4, 3 fixed. Applying the
/// transform twice returns the input exactly.
#[must_use]
pub fn reverse_categories(mut probabilities: [f64; CATEGORIES]) -> [f64; CATEGORIES] {
    probabilities.reverse();
    probabilities
}

/// Category distribution for one trait level against one item's thresholds.
#[must_use]
pub fn category_probabilities(
    trait_level: f64,
    thresholds: &[f64; THRESHOLD_COUNT],
    reversed: bool,
) -> [f64; CATEGORIES] {
    let mut cumulative = [0.0; CATEGORIES];
    for step in 1..CATEGORIES {
        cumulative[step] = cumulative[step - 1] + (trait_level - thresholds[step - 1]);
    }

    let max = cumulative.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let mut probabilities = [0.0; CATEGORIES];
    let mut normalizer = 0.0;
    for (slot, score) in cumulative.iter().enumerate() {
        let weight = (score - max).exp();
        probabilities[slot] = weight;
        normalizer += weight;
    }
    for probability in &mut probabilities {
        *probability /= normalizer;
    }

    if reversed {
        reverse_categories(probabilities)
    } else {
        probabilities
    }
}

/// Model configuration: substantive trait count and priors. The latent
/// dimension equals the trait count; there are no style dimensions.
#[derive(Debug, Clone)]
pub struct PcmConfig {
    pub trait_dimensions: usize,
    pub priors: PriorConfig,
}

impl PcmConfig {
    /// Configuration with the standard hierarchy, including the scalar
    /// covariance prior when only one trait dimension is modeled.
    #[must_use]
    pub fn standard(trait_dimensions: usize) -> Self {
        Self {
            trait_dimensions,
            priors: PriorConfig::standard(trait_dimensions),
        }
    }
}

/// Raw parameter blocks proposed by the external sampler.
#[derive(Debug, Clone)]
pub struct PcmParameters {
    /// Raw person traits, N x S.
    pub theta_raw: Mat<f64>,
    /// Positive scaling vector, length S.
    pub scaling: Vec<f64>,
    /// Raw person covariance, S x S (1 x 1 scalar variance when S == 1).
    pub covariance_raw: Mat<f64>,
    /// Raw item threshold deviations, J x 4.
    pub beta_raw: Mat<f64>,
    /// Hierarchical threshold means by (trait group, threshold), G x 4.
    pub item_means: Mat<f64>,
    /// Raw hierarchical threshold variances, G x 4.
    pub item_variances_raw: Mat<f64>,
}

/// Derived quantities consumed by the evaluator and reporting.
#[derive(Debug, Clone)]
pub struct PcmTransformed {
    pub theta: Mat<f64>,
    pub covariance: Mat<f64>,
    pub beta: Mat<f64>,
    pub item_sds: Mat<f64>,
}

/// A fully validated partial-credit model over one survey.
#[derive(Debug, Clone)]
pub struct PcmModel {
    config: PcmConfig,
    input: SurveyInput,
}

impl PcmModel {
    /// # Errors
    ///
    /// Returns `ModelError` when the survey data are malformed, an item's
    /// trait group exceeds the configured trait dimensions, or the prior
    /// block does not match the latent dimension (in particular, a single
    /// trait dimension requires the scalar covariance prior).
    pub fn new(config: PcmConfig, input: SurveyInput) -> Result<Self, ModelError> {
        input.validate()?;
        if config.trait_dimensions == 0 {
            return Err(ModelError::NoTraitDimensions);
        }
        for (item, &group) in input.trait_group.iter().enumerate() {
            if group > config.trait_dimensions {
                return Err(ModelError::TraitGroupOutOfRange {
                    item,
                    group,
                    groups: config.trait_dimensions,
                });
            }
        }
        config.priors.validate(config.trait_dimensions)?;
        Ok(Self { config, input })
    }

    #[must_use]
    pub const fn config(&self) -> &PcmConfig {
        &self.config
    }

    #[must_use]
    pub const fn input(&self) -> &SurveyInput {
        &self.input
    }

    #[must_use]
    pub const fn latent_dimension(&self) -> usize {
        self.config.trait_dimensions
    }

    /// Parameters at the prior's center.
    #[must_use]
    pub fn neutral_parameters(&self) -> PcmParameters {
        let latent = self.config.trait_dimensions;
        PcmParameters {
            theta_raw: Mat::zeros(self.input.n_persons, latent),
            scaling: vec![1.0; latent],
            covariance_raw: identity_matrix(latent),
            beta_raw: Mat::zeros(self.input.n_items, THRESHOLD_COUNT),
            item_means: Mat::zeros(latent, THRESHOLD_COUNT),
            item_variances_raw: Mat::from_fn(latent, THRESHOLD_COUNT, |_, _| 1.0),
        }
    }

    fn check_dimensions(&self, parameters: &PcmParameters) -> Result<(), EvalError> {
        let latent = self.config.trait_dimensions;
        let checks: [(&'static str, usize, usize); 10] = [
            ("theta_raw rows", self.input.n_persons, parameters.theta_raw.nrows()),
            ("theta_raw columns", latent, parameters.theta_raw.ncols()),
            ("scaling", latent, parameters.scaling.len()),
            ("covariance_raw rows", latent, parameters.covariance_raw.nrows()),
            ("covariance_raw columns", latent, parameters.covariance_raw.ncols()),
            ("beta_raw rows", self.input.n_items, parameters.beta_raw.nrows()),
            ("beta_raw columns", THRESHOLD_COUNT, parameters.beta_raw.ncols()),
            ("item_means rows", latent, parameters.item_means.nrows()),
            ("item_means columns", THRESHOLD_COUNT, parameters.item_means.ncols()),
            ("item_variances_raw rows", latent, parameters.item_variances_raw.nrows()),
        ];
        for (block, expected, found) in checks {
            if expected != found {
                return Err(EvalError::DimensionMismatch {
                    block,
                    expected,
                    found,
                });
            }
        }
        if parameters.item_variances_raw.ncols() != THRESHOLD_COUNT {
            return Err(EvalError::DimensionMismatch {
                block: "item_variances_raw columns",
                expected: THRESHOLD_COUNT,
                found: parameters.item_variances_raw.ncols(),
            });
        }
        Ok(())
    }

    /// Pure transform from raw to interpretable quantities.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::DimensionMismatch`] when a parameter block does
    /// not match the model's shape.
    pub fn transform(&self, parameters: &PcmParameters) -> Result<PcmTransformed, EvalError> {
        self.check_dimensions(parameters)?;
        Ok(self.transform_unchecked(parameters))
    }

    fn transform_unchecked(&self, parameters: &PcmParameters) -> PcmTransformed {
        let latent = self.config.trait_dimensions;
        // The single-dimension case keeps the raw scale outright.
        let (theta, covariance) = if latent == 1 {
            (
                parameters.theta_raw.clone(),
                parameters.covariance_raw.clone(),
            )
        } else {
            (
                Mat::from_fn(self.input.n_persons, latent, |person, slot| {
                    parameters.theta_raw[(person, slot)] * parameters.scaling[slot]
                }),
                Mat::from_fn(latent, latent, |row, col| {
                    parameters.scaling[row]
                        * parameters.scaling[col]
                        * parameters.covariance_raw[(row, col)]
                }),
            )
        };

        let beta = Mat::from_fn(self.input.n_items, THRESHOLD_COUNT, |item, threshold| {
            let group = self.input.trait_group[item] - 1;
            parameters.item_means[(group, threshold)] + parameters.beta_raw[(item, threshold)]
        });

        let item_sds = Mat::from_fn(latent, THRESHOLD_COUNT, |group, threshold| {
            parameters.item_variances_raw[(group, threshold)].max(0.0).sqrt()
        });

        PcmTransformed {
            theta,
            covariance,
            beta,
            item_sds,
        }
    }

    fn item_thresholds(transformed: &PcmTransformed, item: usize) -> [f64; THRESHOLD_COUNT] {
        [
            transformed.beta[(item, 0)],
            transformed.beta[(item, 1)],
            transformed.beta[(item, 2)],
            transformed.beta[(item, 3)],
        ]
    }

    /// Category distribution for one person-item cell.
    #[must_use]
    pub fn cell_probabilities(
        &self,
        transformed: &PcmTransformed,
        person: usize,
        item: usize,
    ) -> [f64; CATEGORIES] {
        let slot = self.input.trait_group[item] - 1;
        category_probabilities(
            transformed.theta[(person, slot)],
            &Self::item_thresholds(transformed, item),
            self.input.reversed[item],
        )
    }

    /// Category distributions for every person-item cell, row-major N x J.
    #[must_use]
    pub fn probability_tensor(&self, transformed: &PcmTransformed) -> Vec<[f64; CATEGORIES]> {
        let mut tensor = Vec::with_capacity(self.input.n_persons * self.input.n_items);
        for person in 0..self.input.n_persons {
            for item in 0..self.input.n_items {
                tensor.push(self.cell_probabilities(transformed, person, item));
            }
        }
        tensor
    }

    fn log_prior(&self, parameters: &PcmParameters) -> Result<f64, EvalError> {
        let priors = &self.config.priors;
        let mut total = scaling_log_prior(
            &parameters.scaling,
            priors.scaling_lower,
            priors.scaling_upper,
        );
        if total == f64::NEG_INFINITY {
            return Ok(f64::NEG_INFINITY);
        }

        total += item_hierarchy_log_prior(
            &parameters.item_means,
            &parameters.item_variances_raw,
            &parameters.beta_raw,
            &self.input.trait_group,
            priors.item_variance_shape,
            priors.item_variance_scale,
        );
        total += covariance_log_prior(&priors.covariance, &parameters.covariance_raw)?;
        total += trait_vectors_log_prior(
            &parameters.theta_raw,
            &priors.trait_mean,
            &parameters.covariance_raw,
        )?;
        Ok(total)
    }

    fn log_likelihood(&self, transformed: &PcmTransformed) -> f64 {
        let mut total = 0.0;
        for person in 0..self.input.n_persons {
            for item in 0..self.input.n_items {
                let cell = self.cell_probabilities(transformed, person, item);
                total += log_category_probability(cell[self.input.category_index(person, item)]);
            }
        }
        total
    }

    /// Posterior-predictive responses for the predictive subset, row-major
    /// N2 x J, reproducible for a fixed seed.
    #[must_use]
    pub fn posterior_predictive(
        &self,
        transformed: &PcmTransformed,
        rng: &mut StdRng,
    ) -> Vec<u8> {
        let persons = self.input.predictive_persons;
        let mut predicted = Vec::with_capacity(persons * self.input.n_items);
        for person in 0..persons {
            for item in 0..self.input.n_items {
                let cell = self.cell_probabilities(transformed, person, item);
                predicted.push(draw_category(rng, &cell));
            }
        }
        predicted
    }

    /// Record one retained posterior sample.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] when the parameter blocks do not match the
    /// model's shape.
    pub fn posterior_draw(
        &self,
        parameters: &PcmParameters,
        rng: &mut StdRng,
    ) -> Result<PosteriorDraw, EvalError> {
        let transformed = self.transform(parameters)?;
        let correlation = correlation_from_covariance(&transformed.covariance);
        let predicted = self.posterior_predictive(&transformed, rng);
        Ok(PosteriorDraw {
            theta: transformed.theta,
            covariance: transformed.covariance,
            correlation,
            beta: transformed.beta,
            item_means: parameters.item_means.clone(),
            item_sds: transformed.item_sds,
            predicted,
            predictive_persons: self.input.predictive_persons,
        })
    }
}

impl LogDensityModel for PcmModel {
    type Parameters = PcmParameters;

    fn log_density(&self, parameters: &PcmParameters) -> Result<f64, EvalError> {
        self.check_dimensions(parameters)?;
        let prior = self.log_prior(parameters)?;
        if prior == f64::NEG_INFINITY {
            return Ok(f64::NEG_INFINITY);
        }
        let transformed = self.transform_unchecked(parameters);
        let total = prior + self.log_likelihood(&transformed);
        if total.is_nan() {
            return Err(EvalError::NonFiniteDensity);
        }
        Ok(total)
    }

    fn parameter_dimension(&self) -> usize {
        let latent = self.config.trait_dimensions;
        self.input.n_persons * latent
            + latent
            + latent * latent
            + self.input.n_items * THRESHOLD_COUNT
            + 2 * latent * THRESHOLD_COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::priors::CovariancePrior;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn survey(trait_group: Vec<usize>, reversed: Vec<bool>) -> SurveyInput {
        let n_items = trait_group.len();
        let n_persons = 3;
        let responses: Vec<u8> = (0..n_persons * n_items)
            .map(|cell| u8::try_from(cell % 5 + 1).unwrap_or(1))
            .collect();
        SurveyInput::new(n_persons, n_items, responses, reversed, trait_group)
    }

    #[test]
    fn probabilities_sum_to_one() {
        let thresholds = [-1.0, -0.2, 0.3, 1.4];
        for trait_level in [-2.5, 0.0, 0.7, 3.0] {
            for reversed in [false, true] {
                let probabilities = category_probabilities(trait_level, &thresholds, reversed);
                assert_relative_eq!(probabilities.iter().sum::<f64>(), 1.0, epsilon = 1.0e-9);
                assert!(probabilities.iter().all(|&p| p > 0.0));
            }
        }
    }

    #[test]
    fn double_reversal_is_exact_identity() {
        let probabilities = category_probabilities(0.8, &[-0.5, 0.0, 0.5, 1.0], false);
        let twice = reverse_categories(reverse_categories(probabilities));
        assert_eq!(probabilities, twice);
    }

    #[test]
    fn reversal_mirrors_the_distribution() {
        let thresholds = [0.0; THRESHOLD_COUNT];
        let forward = category_probabilities(1.5, &thresholds, false);
        let reversed = category_probabilities(1.5, &thresholds, true);
        for slot in 0..CATEGORIES {
            assert_relative_eq!(forward[slot], reversed[CATEGORIES - 1 - slot]);
        }
        // A high trait level favors high categories; reversal favors low ones.
        assert!(forward[4] > forward[0]);
        assert!(reversed[0] > reversed[4]);
    }

    #[test]
    fn zero_trait_and_thresholds_are_uniform() {
        let probabilities = category_probabilities(0.0, &[0.0; THRESHOLD_COUNT], false);
        for probability in probabilities {
            assert_relative_eq!(probability, 0.2, epsilon = 1.0e-12);
        }
    }

    #[test]
    fn single_dimension_uses_scalar_covariance_prior() {
        let model = PcmModel::new(PcmConfig::standard(1), survey(vec![1, 1], vec![false, false]))
            .expect("scalar prior arm is selected automatically");
        assert!(matches!(
            model.config().priors.covariance,
            CovariancePrior::InverseGamma { .. }
        ));
        let density = model
            .log_density(&model.neutral_parameters())
            .expect("evaluation succeeds");
        assert!(density.is_finite());
    }

    #[test]
    fn single_dimension_rejects_matrix_prior_at_construction() {
        let mut config = PcmConfig::standard(1);
        config.priors.covariance = CovariancePrior::InverseWishart {
            degrees_of_freedom: 2.0,
            scale: identity_matrix(1),
        };
        let result = PcmModel::new(config, survey(vec![1, 1], vec![false, false]));
        assert!(matches!(
            result,
            Err(ModelError::ScalarCovariancePriorRequired)
        ));
    }

    #[test]
    fn multivariate_model_has_finite_density() {
        let model = PcmModel::new(PcmConfig::standard(2), survey(vec![1, 2], vec![false, true]))
            .expect("configuration is valid");
        let density = model
            .log_density(&model.neutral_parameters())
            .expect("evaluation succeeds");
        assert!(density.is_finite());
    }

    #[test]
    fn tensor_rows_are_simplices() {
        let model = PcmModel::new(PcmConfig::standard(2), survey(vec![1, 2], vec![false, true]))
            .expect("configuration is valid");
        let mut parameters = model.neutral_parameters();
        parameters.theta_raw[(0, 0)] = 1.3;
        parameters.item_means[(1, 2)] = -0.6;
        let transformed = model.transform(&parameters).expect("dimensions match");
        for cell in model.probability_tensor(&transformed) {
            assert_relative_eq!(cell.iter().sum::<f64>(), 1.0, epsilon = 1.0e-9);
        }
    }

    #[test]
    fn predictive_draws_are_reproducible() {
        let model = PcmModel::new(PcmConfig::standard(1), survey(vec![1, 1], vec![false, false]))
            .expect("configuration is valid");
        let parameters = model.neutral_parameters();
        let transformed = model.transform(&parameters).expect("dimensions match");
        let first = model.posterior_predictive(&transformed, &mut StdRng::seed_from_u64(5));
        let second = model.posterior_predictive(&transformed, &mut StdRng::seed_from_u64(5));
        assert_eq!(first, second);
    }

    #[test]
    fn dimension_mismatch_names_the_block() {
        let model = PcmModel::new(PcmConfig::standard(2), survey(vec![1, 2], vec![false, false]))
            .expect("configuration is valid");
        let mut parameters = model.neutral_parameters();
        parameters.beta_raw = Mat::zeros(1, THRESHOLD_COUNT);
        let error = model
            .log_density(&parameters)
            .expect_err("mismatch must fail");
        assert_eq!(
            error,
            EvalError::DimensionMismatch {
                block: "beta_raw rows",
                expected: 2,
                found: 1
            }
        );
    }
}
