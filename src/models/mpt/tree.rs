//! The processing-tree mapping from latent processes to the five-category
//! response distribution.

use crate::models::probability::{CATEGORIES, normal_cdf_link};

use super::types::{
    ACQUIESCENCE_SLOT, AcquiescenceSource, EXTREME_SLOT, MIDDLE_SLOT, MptVariant,
    PostAcquiescenceExtremity, ProcessLayout,
};

/// Per-item keying metadata consumed by the tree. `trait_group` is 1-based.
#[derive(Debug, Clone, Copy)]
pub struct ItemDesign {
    pub reversed: bool,
    pub trait_group: usize,
}

/// Outcomes of the binary branch processes for one person-item pair.
///
/// `acquiescence` and `post_acquiescence_extreme` are exactly zero for
/// variants without an acquiescence branch, collapsing the tree to its
/// styles-only form.
#[derive(Debug, Clone, Copy)]
pub struct ProcessProbabilities {
    pub middle: f64,
    pub extreme: f64,
    pub acquiescence: f64,
    pub trait_agreement: f64,
    pub post_acquiescence_extreme: f64,
}

/// Evaluate every branch process for one person-item pair.
#[must_use]
pub fn process_probabilities(
    variant: MptVariant,
    theta: &[f64],
    beta: &[f64],
    shared_extremity_location: f64,
    item: ItemDesign,
) -> ProcessProbabilities {
    let layout = ProcessLayout::for_variant(variant);

    let middle = normal_cdf_link(theta[MIDDLE_SLOT] - beta[layout.middle]);
    let extreme = normal_cdf_link(theta[EXTREME_SLOT] - beta[layout.extreme]);

    // Reverse keying flips the comparison, not the category order.
    let direction = if item.reversed { -1.0 } else { 1.0 };
    let trait_slot = variant.trait_slot(item.trait_group);
    let trait_agreement =
        normal_cdf_link(direction * (theta[trait_slot] - beta[layout.trait_location]));

    let acquiescence = layout.acquiescence.map_or(0.0, |column| {
        let source_slot = match variant.acquiescence_source() {
            AcquiescenceSource::LastDimensionFirstGroup if item.trait_group == 1 => theta.len() - 1,
            _ => ACQUIESCENCE_SLOT,
        };
        normal_cdf_link(theta[source_slot] - beta[column])
    });

    let post_acquiescence_extreme = match variant.post_acquiescence_extremity() {
        None => 0.0,
        Some(PostAcquiescenceExtremity::Shared) => {
            normal_cdf_link(theta[EXTREME_SLOT] - shared_extremity_location)
        }
        Some(PostAcquiescenceExtremity::PerItem) => layout
            .post_acquiescence
            .map_or(0.0, |column| normal_cdf_link(theta[EXTREME_SLOT] - beta[column])),
    };

    ProcessProbabilities {
        middle,
        extreme,
        acquiescence,
        trait_agreement,
        post_acquiescence_extreme,
    }
}

/// Combine the branch processes into the 5-category distribution.
///
/// The five terms partition the tree: the non-acquiescent mass
/// `(1 - a)` splits across midpoint vs. trait-by-extremity branches and the
/// acquiescent mass `a` splits across the post-acquiescence extremity, so
/// the entries sum to one by construction.
#[must_use]
pub fn category_probabilities(processes: &ProcessProbabilities) -> [f64; CATEGORIES] {
    let direct = 1.0 - processes.acquiescence;
    let moderate = 1.0 - processes.extreme;
    let off_middle = direct * (1.0 - processes.middle);
    let disagree = 1.0 - processes.trait_agreement;

    [
        off_middle * disagree * processes.extreme,
        off_middle * disagree * moderate,
        direct * processes.middle,
        off_middle * processes.trait_agreement * moderate
            + processes.acquiescence * (1.0 - processes.post_acquiescence_extreme),
        off_middle * processes.trait_agreement * processes.extreme
            + processes.acquiescence * processes.post_acquiescence_extreme,
    ]
}
