//! Response-style model: construction-time validation, the pure parameter
//! transform, tree evaluation over the whole survey, the joint log-density,
//! and posterior-predictive generation.

use faer::Mat;
use rand::rngs::StdRng;

use crate::inference::{EvalError, LogDensityModel};
use crate::input::SurveyInput;
use crate::models::ModelError;
use crate::models::posterior::PosteriorDraw;
use crate::models::priors::{
    covariance_log_prior, item_hierarchy_log_prior, log_standard_normal_density,
    scaling_log_prior, trait_vectors_log_prior,
};
use crate::models::probability::{CATEGORIES, draw_category, log_category_probability};
use crate::utils::{correlation_from_covariance, identity_matrix};

use super::tree::{ItemDesign, category_probabilities, process_probabilities};
use super::types::{
    MptConfig, MptParameters, MptTransformed, MptVariant, PostAcquiescenceExtremity, ProcessLayout,
};

/// A fully validated response-style model over one survey.
///
/// Construction checks every configuration invariant; afterwards all
/// evaluation methods are pure and safe to call concurrently from
/// independent chains.
#[derive(Debug, Clone)]
pub struct MptModel {
    config: MptConfig,
    input: SurveyInput,
    layout: ProcessLayout,
    latent_dimension: usize,
}

impl MptModel {
    /// # Errors
    ///
    /// Returns `ModelError` when the survey data are malformed, an item's
    /// trait group exceeds the configured trait dimensions, or the prior
    /// block is inconsistent with the implied latent dimension.
    pub fn new(config: MptConfig, input: SurveyInput) -> Result<Self, ModelError> {
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
        let latent_dimension = config.latent_dimension();
        config.priors.validate(latent_dimension)?;
        let layout = ProcessLayout::for_variant(config.variant);
        Ok(Self {
            config,
            input,
            layout,
            latent_dimension,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &MptConfig {
        &self.config
    }

    #[must_use]
    pub const fn input(&self) -> &SurveyInput {
        &self.input
    }

    #[must_use]
    pub const fn variant(&self) -> MptVariant {
        self.config.variant
    }

    #[must_use]
    pub const fn latent_dimension(&self) -> usize {
        self.latent_dimension
    }

    #[must_use]
    pub const fn process_count(&self) -> usize {
        self.layout.count
    }

    /// Parameters at the prior's center: zero locations, unit scales, and an
    /// identity raw covariance. Useful as a deterministic starting point.
    #[must_use]
    pub fn neutral_parameters(&self) -> MptParameters {
        let persons = self.input.n_persons;
        let items = self.input.n_items;
        let latent = self.latent_dimension;
        let groups = self.config.trait_dimensions;
        let processes = self.layout.count;
        MptParameters {
            theta_raw: Mat::zeros(persons, latent),
            scaling: vec![1.0; latent],
            covariance_raw: identity_matrix(latent),
            beta_raw: Mat::zeros(items, processes),
            item_means: Mat::zeros(groups, processes),
            item_variances_raw: Mat::from_fn(groups, processes, |_, _| 1.0),
            shared_extremity_location: 0.0,
        }
    }

    fn check_dimensions(&self, parameters: &MptParameters) -> Result<(), EvalError> {
        let checks: [(&'static str, usize, usize); 10] = [
            ("theta_raw rows", self.input.n_persons, parameters.theta_raw.nrows()),
            ("theta_raw columns", self.latent_dimension, parameters.theta_raw.ncols()),
            ("scaling", self.latent_dimension, parameters.scaling.len()),
            ("covariance_raw rows", self.latent_dimension, parameters.covariance_raw.nrows()),
            ("covariance_raw columns", self.latent_dimension, parameters.covariance_raw.ncols()),
            ("beta_raw rows", self.input.n_items, parameters.beta_raw.nrows()),
            ("beta_raw columns", self.layout.count, parameters.beta_raw.ncols()),
            ("item_means rows", self.config.trait_dimensions, parameters.item_means.nrows()),
            ("item_means columns", self.layout.count, parameters.item_means.ncols()),
            ("item_variances_raw rows", self.config.trait_dimensions, parameters.item_variances_raw.nrows()),
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
        if parameters.item_variances_raw.ncols() != self.layout.count {
            return Err(EvalError::DimensionMismatch {
                block: "item_variances_raw columns",
                expected: self.layout.count,
                found: parameters.item_variances_raw.ncols(),
            });
        }
        Ok(())
    }

    /// Pure transform from raw to interpretable quantities. No randomness,
    /// no side effects; recomputed in full on every proposal.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::DimensionMismatch`] when a parameter block does
    /// not match the model's shape.
    pub fn transform(&self, parameters: &MptParameters) -> Result<MptTransformed, EvalError> {
        self.check_dimensions(parameters)?;
        Ok(self.transform_unchecked(parameters))
    }

    fn transform_unchecked(&self, parameters: &MptParameters) -> MptTransformed {
        let latent = self.latent_dimension;
        // A single latent dimension keeps the raw scale outright.
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

        let beta = Mat::from_fn(self.input.n_items, self.layout.count, |item, process| {
            let group = self.input.trait_group[item] - 1;
            parameters.item_means[(group, process)] + parameters.beta_raw[(item, process)]
        });

        let item_sds = Mat::from_fn(
            self.config.trait_dimensions,
            self.layout.count,
            |group, process| parameters.item_variances_raw[(group, process)].max(0.0).sqrt(),
        );

        MptTransformed {
            theta,
            covariance,
            beta,
            item_sds,
            shared_extremity_location: parameters.shared_extremity_location,
        }
    }

    fn theta_row(&self, transformed: &MptTransformed, person: usize) -> Vec<f64> {
        (0..self.latent_dimension)
            .map(|slot| transformed.theta[(person, slot)])
            .collect()
    }

    fn beta_row(&self, transformed: &MptTransformed, item: usize) -> Vec<f64> {
        (0..self.layout.count)
            .map(|process| transformed.beta[(item, process)])
            .collect()
    }

    fn item_design(&self, item: usize) -> ItemDesign {
        ItemDesign {
            reversed: self.input.reversed[item],
            trait_group: self.input.trait_group[item],
        }
    }

    /// Category distribution for one person-item cell.
    #[must_use]
    pub fn cell_probabilities(
        &self,
        transformed: &MptTransformed,
        person: usize,
        item: usize,
    ) -> [f64; CATEGORIES] {
        let theta = self.theta_row(transformed, person);
        let beta = self.beta_row(transformed, item);
        let processes = process_probabilities(
            self.config.variant,
            &theta,
            &beta,
            transformed.shared_extremity_location,
            self.item_design(item),
        );
        category_probabilities(&processes)
    }

    /// Category distributions for every person-item cell, row-major N x J.
    #[must_use]
    pub fn probability_tensor(&self, transformed: &MptTransformed) -> Vec<[f64; CATEGORIES]> {
        let beta_rows: Vec<Vec<f64>> = (0..self.input.n_items)
            .map(|item| self.beta_row(transformed, item))
            .collect();
        let mut tensor = Vec::with_capacity(self.input.n_persons * self.input.n_items);
        for person in 0..self.input.n_persons {
            let theta = self.theta_row(transformed, person);
            for (item, beta) in beta_rows.iter().enumerate() {
                let processes = process_probabilities(
                    self.config.variant,
                    &theta,
                    beta,
                    transformed.shared_extremity_location,
                    self.item_design(item),
                );
                tensor.push(category_probabilities(&processes));
            }
        }
        tensor
    }

    fn log_prior(&self, parameters: &MptParameters) -> Result<f64, EvalError> {
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
        if self.config.variant.post_acquiescence_extremity()
            == Some(PostAcquiescenceExtremity::Shared)
        {
            total += log_standard_normal_density(parameters.shared_extremity_location);
        }
        Ok(total)
    }

    fn log_likelihood(&self, transformed: &MptTransformed) -> f64 {
        let tensor = self.probability_tensor(transformed);
        let mut total = 0.0;
        for person in 0..self.input.n_persons {
            for item in 0..self.input.n_items {
                let cell = &tensor[person * self.input.n_items + item];
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
        transformed: &MptTransformed,
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

    /// Record one retained posterior sample: transformed parameters, the
    /// derived correlation matrix, and a posterior-predictive draw.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] when the parameter blocks do not match the
    /// model's shape.
    pub fn posterior_draw(
        &self,
        parameters: &MptParameters,
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

impl LogDensityModel for MptModel {
    type Parameters = MptParameters;

    fn log_density(&self, parameters: &MptParameters) -> Result<f64, EvalError> {
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
        let latent = self.latent_dimension;
        let processes = self.layout.count;
        let shared = usize::from(
            self.config.variant.post_acquiescence_extremity()
                == Some(PostAcquiescenceExtremity::Shared),
        );
        self.input.n_persons * latent
            + latent
            + latent * latent
            + self.input.n_items * processes
            + 2 * self.config.trait_dimensions * processes
            + shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::priors::{CovariancePrior, PriorConfig};
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn survey(n_items: usize, trait_group: Vec<usize>) -> SurveyInput {
        let n_persons = 3;
        let responses: Vec<u8> = (0..n_persons * n_items)
            .map(|cell| u8::try_from(cell % 5 + 1).unwrap_or(1))
            .collect();
        SurveyInput::new(
            n_persons,
            n_items,
            responses,
            vec![false; n_items],
            trait_group,
        )
    }

    fn model(variant: MptVariant, trait_dimensions: usize) -> MptModel {
        let trait_group: Vec<usize> = (0..2).map(|item| item % trait_dimensions + 1).collect();
        MptModel::new(
            MptConfig::standard(variant, trait_dimensions),
            survey(2, trait_group),
        )
        .expect("configuration is valid")
    }

    #[test]
    fn construction_rejects_out_of_range_trait_group() {
        let result = MptModel::new(
            MptConfig::standard(MptVariant::Acquiescence, 1),
            survey(2, vec![1, 2]),
        );
        assert!(matches!(
            result,
            Err(ModelError::TraitGroupOutOfRange {
                item: 1,
                group: 2,
                groups: 1
            })
        ));
    }

    #[test]
    fn construction_rejects_scalar_prior_mismatch() {
        let mut config = MptConfig::standard(MptVariant::StylesOnly, 1);
        config.priors = PriorConfig {
            covariance: CovariancePrior::InverseGamma {
                shape: 1.0,
                scale: 1.0,
            },
            ..PriorConfig::standard(3)
        };
        let result = MptModel::new(config, survey(2, vec![1, 1]));
        assert!(matches!(
            result,
            Err(ModelError::MatrixCovariancePriorRequired { dims: 3 })
        ));
    }

    #[test]
    fn neutral_parameters_have_finite_density() {
        for variant in [
            MptVariant::StylesOnly,
            MptVariant::Acquiescence,
            MptVariant::AcquiescenceShared,
        ] {
            let model = model(variant, 2);
            let density = model
                .log_density(&model.neutral_parameters())
                .expect("evaluation succeeds");
            assert!(density.is_finite());
        }
    }

    #[test]
    fn dimension_mismatch_is_reported_with_block_name() {
        let model = model(MptVariant::Acquiescence, 1);
        let mut parameters = model.neutral_parameters();
        parameters.scaling.pop();
        let error = model
            .log_density(&parameters)
            .expect_err("mismatch must fail");
        assert_eq!(
            error,
            EvalError::DimensionMismatch {
                block: "scaling",
                expected: 4,
                found: 3
            }
        );
        assert!(!error.is_recoverable());
    }

    #[test]
    fn out_of_bound_scaling_is_rejected_in_band() {
        let model = model(MptVariant::StylesOnly, 1);
        let mut parameters = model.neutral_parameters();
        parameters.scaling[0] = 50.0;
        let density = model
            .log_density(&parameters)
            .expect("bound violations reject in-band");
        assert_eq!(density, f64::NEG_INFINITY);
    }

    #[test]
    fn non_positive_definite_covariance_rejects_recoverably() {
        let model = model(MptVariant::StylesOnly, 1);
        let mut parameters = model.neutral_parameters();
        let latent = model.latent_dimension();
        parameters.covariance_raw = Mat::from_fn(latent, latent, |_, _| 1.0);
        parameters.covariance_raw[(0, 1)] = 2.0;
        parameters.covariance_raw[(1, 0)] = 2.0;
        let error = model
            .log_density(&parameters)
            .expect_err("indefinite covariance must fail");
        assert_eq!(error, EvalError::CovarianceNotPositiveDefinite);
        assert!(error.is_recoverable());
    }

    #[test]
    fn probability_tensor_rows_are_simplices() {
        let model = model(MptVariant::AcquiescenceShared, 2);
        let mut parameters = model.neutral_parameters();
        parameters.theta_raw[(0, 0)] = 0.8;
        parameters.theta_raw[(1, 3)] = -1.2;
        parameters.shared_extremity_location = 0.4;
        let transformed = model.transform(&parameters).expect("dimensions match");
        for cell in model.probability_tensor(&transformed) {
            assert_relative_eq!(cell.iter().sum::<f64>(), 1.0, epsilon = 1.0e-9);
        }
    }

    #[test]
    fn transform_applies_scaling_to_traits_and_covariance() {
        let model = model(MptVariant::StylesOnly, 1);
        let mut parameters = model.neutral_parameters();
        parameters.theta_raw[(0, 2)] = 2.0;
        parameters.scaling = vec![1.0, 1.0, 0.5];
        let transformed = model.transform(&parameters).expect("dimensions match");
        assert_relative_eq!(transformed.theta[(0, 2)], 1.0);
        assert_relative_eq!(transformed.covariance[(2, 2)], 0.25);
    }

    #[test]
    fn posterior_draw_is_reproducible_for_fixed_seed() {
        let model = model(MptVariant::Acquiescence, 2);
        let parameters = model.neutral_parameters();
        let first = model
            .posterior_draw(&parameters, &mut StdRng::seed_from_u64(99))
            .expect("draw succeeds");
        let second = model
            .posterior_draw(&parameters, &mut StdRng::seed_from_u64(99))
            .expect("draw succeeds");
        assert_eq!(first.predicted, second.predicted);
        assert_eq!(first.predicted.len(), 2 * 3);
    }

    #[test]
    fn parameter_dimension_counts_every_block() {
        let model = model(MptVariant::AcquiescenceShared, 1);
        // 3 persons x 4 latent + 4 scaling + 16 covariance + 2 items x 4
        // processes + 2 x (1 group x 4 processes) + 1 shared location.
        assert_eq!(model.parameter_dimension(), 12 + 4 + 16 + 8 + 8 + 1);
    }
}
