use ordinal_response_models::{
    CovariancePrior, LogDensityModel, PcmConfig, PcmModel, PosteriorSamples, SurveyInput,
    summarize_posterior,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn survey() -> SurveyInput {
    SurveyInput::new(
        3,
        2,
        vec![2, 5, 1, 4, 3, 3],
        vec![false, true],
        vec![1, 1],
    )
}

#[test]
fn single_trait_model_runs_on_the_scalar_covariance_prior() {
    let model = PcmModel::new(PcmConfig::standard(1), survey()).expect("valid configuration");
    assert!(matches!(
        model.config().priors.covariance,
        CovariancePrior::InverseGamma { .. }
    ));

    let mut parameters = model.neutral_parameters();
    parameters.theta_raw[(0, 0)] = 1.1;
    parameters.theta_raw[(2, 0)] = -0.8;
    let density = model.log_density(&parameters).expect("evaluation succeeds");
    assert!(density.is_finite());
}

#[test]
fn reversed_item_mirrors_the_unreversed_distribution() {
    let model = PcmModel::new(PcmConfig::standard(1), survey()).expect("valid configuration");
    let mut parameters = model.neutral_parameters();
    parameters.theta_raw[(0, 0)] = 1.4;
    let transformed = model.transform(&parameters).expect("dimensions match");

    // Both items share group-1 thresholds at zero; item 1 is reverse-keyed.
    let forward = model.cell_probabilities(&transformed, 0, 0);
    let reversed = model.cell_probabilities(&transformed, 0, 1);
    for slot in 0..forward.len() {
        assert!((forward[slot] - reversed[forward.len() - 1 - slot]).abs() < 1.0e-12);
    }
}

#[test]
fn two_trait_model_keeps_groups_apart() {
    let input = SurveyInput::new(2, 2, vec![1, 5, 2, 4], vec![false, false], vec![1, 2]);
    let model = PcmModel::new(PcmConfig::standard(2), input).expect("valid configuration");

    let mut parameters = model.neutral_parameters();
    // Raise only the second trait; only the group-2 item should respond.
    parameters.theta_raw[(0, 1)] = 2.0;
    let transformed = model.transform(&parameters).expect("dimensions match");

    let group_one = model.cell_probabilities(&transformed, 0, 0);
    let group_two = model.cell_probabilities(&transformed, 0, 1);
    assert!((group_one[4] - 0.2).abs() < 1.0e-12);
    assert!(group_two[4] > group_one[4]);
}

#[test]
fn posterior_workflow_counts_threshold_cells() {
    let model = PcmModel::new(PcmConfig::standard(1), survey()).expect("valid configuration");
    let mut rng = StdRng::seed_from_u64(404);

    let mut samples = PosteriorSamples::default();
    for _ in 0..3 {
        let parameters = model.neutral_parameters();
        samples.push(model.posterior_draw(&parameters, &mut rng).expect("draw"));
    }

    let summary = summarize_posterior(&samples);
    assert_eq!(summary.draw_count, 3);
    // One latent dimension: no off-diagonal correlations, four thresholds.
    assert!(summary.correlations.is_empty());
    assert_eq!(summary.item_means.len(), 4);
    assert_eq!(summary.item_sds.len(), 4);
}

#[test]
fn predictive_draws_repeat_under_a_fixed_seed() {
    let model = PcmModel::new(PcmConfig::standard(1), survey()).expect("valid configuration");
    let parameters = model.neutral_parameters();
    let first = model
        .posterior_draw(&parameters, &mut StdRng::seed_from_u64(77))
        .expect("draw");
    let second = model
        .posterior_draw(&parameters, &mut StdRng::seed_from_u64(77))
        .expect("draw");
    assert_eq!(first.predicted, second.predicted);
    assert!(first.predicted.iter().all(|&c| (1..=5).contains(&c)));
}
