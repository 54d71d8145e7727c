#![forbid(unsafe_code)]

//! # `ordinal_response_models`
//!
//! Hierarchical Bayesian models for 5-point ordinal survey responses: a
//! multinomial-processing-tree family decomposing each choice into
//! response-style processes (midpoint preference, extremity, acquiescence)
//! and a substantive trait, plus a partial-credit ordinal alternative built
//! on the same person/item hierarchy.
//!
//! The crate evaluates joint log-densities and generates posterior-predictive
//! draws; proposing parameters is the job of an external MCMC or HMC engine,
//! which talks to the models through [`LogDensityModel`].

pub mod inference;
pub mod input;
pub mod models;
pub mod report;
pub mod utils;

pub use inference::{EvalError, LogDensityModel};
pub use input::{InputError, SurveyInput};
pub use models::ModelError;

pub use models::mpt::{
    AcquiescenceSource, ItemDesign, MptConfig, MptModel, MptParameters, MptTransformed,
    MptVariant, PostAcquiescenceExtremity, ProcessLayout, ProcessProbabilities,
    category_probabilities as mpt_category_probabilities,
    process_probabilities as mpt_process_probabilities,
};

pub use models::pcm::{
    PcmConfig, PcmModel, PcmParameters, PcmTransformed, THRESHOLD_COUNT,
    category_probabilities as pcm_category_probabilities, reverse_categories,
};

pub use models::posterior::{
    CorrelationSummary, ItemCellSummary, ParameterSummary, PosteriorDraw, PosteriorSamples,
    PosteriorSummary, summarize_posterior,
};

pub use models::priors::{CovariancePrior, PriorConfig};

pub use models::probability::{CATEGORIES, CATEGORY_FLOOR, PROBABILITY_FLOOR};

pub use report::{PosteriorTables, render_posterior_tables};
