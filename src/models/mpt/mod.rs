//! Response-style processing-tree models for 5-point survey items.
//!
//! Decomposes each categorical choice into binary cognitive processes
//! (midpoint preference, extremity, acquiescence, trait agreement) with a
//! shared person/item hierarchy over the latent parameters. Three named tree
//! variants cover the styles-only core and the two acquiescence extensions.

pub mod model;
pub mod tree;
pub mod types;

pub use model::MptModel;
pub use tree::{ItemDesign, ProcessProbabilities, category_probabilities, process_probabilities};
pub use types::{
    ACQUIESCENCE_SLOT, AcquiescenceSource, EXTREME_SLOT, MIDDLE_SLOT, MptConfig, MptParameters,
    MptTransformed, MptVariant, PostAcquiescenceExtremity, ProcessLayout,
};
