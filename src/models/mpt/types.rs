//! Core public types for the response-style family.

use faer::Mat;

use crate::models::priors::PriorConfig;

/// Latent slot holding the midpoint-preference style.
pub const MIDDLE_SLOT: usize = 0;
/// Latent slot holding the extremity style.
pub const EXTREME_SLOT: usize = 1;
/// Latent slot holding acquiescence in the variants that model it.
pub const ACQUIESCENCE_SLOT: usize = 2;

/// The three response-style tree variants.
///
/// All three decompose a 5-category choice into binary cognitive processes;
/// they differ in whether acquiescence is modeled and, if so, how the
/// post-acquiescence extremity process is parameterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MptVariant {
    /// Midpoint and extremity styles plus the keyed trait process.
    StylesOnly,
    /// Adds an acquiescence branch with an item-level post-acquiescence
    /// extremity process (one extra parameter column per item).
    Acquiescence,
    /// Acquiescence branch with a single person-level post-acquiescence
    /// extremity location shared across items. Items in trait group 1 read
    /// acquiescence from the model's last latent dimension, tying that style
    /// to a specific trait slot.
    AcquiescenceShared,
}

/// Which latent slot feeds the acquiescence process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquiescenceSource {
    /// No acquiescence branch.
    None,
    /// The dedicated style slot, for every item.
    StyleSlot,
    /// The last latent dimension for trait-group-1 items, the style slot
    /// otherwise.
    LastDimensionFirstGroup,
}

/// Granularity of the post-acquiescence extremity process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAcquiescenceExtremity {
    /// Item-specific location: an extra parameter column.
    PerItem,
    /// One location shared by all items.
    Shared,
}

impl MptVariant {
    #[must_use]
    pub const fn has_acquiescence(self) -> bool {
        !matches!(self, Self::StylesOnly)
    }

    #[must_use]
    pub const fn acquiescence_source(self) -> AcquiescenceSource {
        match self {
            Self::StylesOnly => AcquiescenceSource::None,
            Self::Acquiescence => AcquiescenceSource::StyleSlot,
            Self::AcquiescenceShared => AcquiescenceSource::LastDimensionFirstGroup,
        }
    }

    #[must_use]
    pub const fn post_acquiescence_extremity(self) -> Option<PostAcquiescenceExtremity> {
        match self {
            Self::StylesOnly => None,
            Self::Acquiescence => Some(PostAcquiescenceExtremity::PerItem),
            Self::AcquiescenceShared => Some(PostAcquiescenceExtremity::Shared),
        }
    }

    /// Number of style slots preceding the trait dimensions.
    #[must_use]
    pub const fn style_dimensions(self) -> usize {
        match self {
            Self::StylesOnly => 2,
            Self::Acquiescence | Self::AcquiescenceShared => 3,
        }
    }

    /// Total latent dimension for `trait_dimensions` substantive traits.
    #[must_use]
    pub const fn latent_dimension(self, trait_dimensions: usize) -> usize {
        self.style_dimensions() + trait_dimensions
    }

    /// Latent slot for an item's substantive trait, `group` being 1-based.
    #[must_use]
    pub const fn trait_slot(self, group: usize) -> usize {
        self.style_dimensions() + group - 1
    }

    /// Number of item-parameter columns.
    #[must_use]
    pub const fn process_count(self) -> usize {
        match self {
            Self::StylesOnly => 3,
            Self::Acquiescence => 5,
            Self::AcquiescenceShared => 4,
        }
    }
}

/// Column mapping for the item-parameter matrix of one variant.
#[derive(Debug, Clone, Copy)]
pub struct ProcessLayout {
    pub middle: usize,
    pub extreme: usize,
    pub acquiescence: Option<usize>,
    pub trait_location: usize,
    pub post_acquiescence: Option<usize>,
    pub count: usize,
}

impl ProcessLayout {
    #[must_use]
    pub const fn for_variant(variant: MptVariant) -> Self {
        match variant {
            MptVariant::StylesOnly => Self {
                middle: 0,
                extreme: 1,
                acquiescence: None,
                trait_location: 2,
                post_acquiescence: None,
                count: 3,
            },
            MptVariant::Acquiescence => Self {
                middle: 0,
                extreme: 1,
                acquiescence: Some(2),
                trait_location: 3,
                post_acquiescence: Some(4),
                count: 5,
            },
            MptVariant::AcquiescenceShared => Self {
                middle: 0,
                extreme: 1,
                acquiescence: Some(2),
                trait_location: 3,
                post_acquiescence: None,
                count: 4,
            },
        }
    }
}

/// Model configuration: tree variant, substantive trait count, priors.
#[derive(Debug, Clone)]
pub struct MptConfig {
    pub variant: MptVariant,
    pub trait_dimensions: usize,
    pub priors: PriorConfig,
}

impl MptConfig {
    /// Configuration with the standard hierarchy for the implied latent
    /// dimension.
    #[must_use]
    pub fn standard(variant: MptVariant, trait_dimensions: usize) -> Self {
        let priors = PriorConfig::standard(variant.latent_dimension(trait_dimensions));
        Self {
            variant,
            trait_dimensions,
            priors,
        }
    }

    #[must_use]
    pub const fn latent_dimension(&self) -> usize {
        self.variant.latent_dimension(self.trait_dimensions)
    }
}

/// Raw parameter blocks proposed by the external sampler.
///
/// `shared_extremity_location` is read only by the shared-extremity variant;
/// the other variants ignore it.
#[derive(Debug, Clone)]
pub struct MptParameters {
    /// Raw person traits, N x S.
    pub theta_raw: Mat<f64>,
    /// Positive scaling vector, length S.
    pub scaling: Vec<f64>,
    /// Raw person covariance, S x S.
    pub covariance_raw: Mat<f64>,
    /// Raw item deviations, J x P.
    pub beta_raw: Mat<f64>,
    /// Hierarchical item means by (trait group, process), G x P.
    pub item_means: Mat<f64>,
    /// Raw hierarchical item variances by (trait group, process), G x P.
    pub item_variances_raw: Mat<f64>,
    /// Location of the shared post-acquiescence extremity process.
    pub shared_extremity_location: f64,
}

/// Derived quantities consumed by the tree evaluator and reporting.
#[derive(Debug, Clone)]
pub struct MptTransformed {
    /// Rescaled person traits, N x S.
    pub theta: Mat<f64>,
    /// Rescaled person covariance, S x S.
    pub covariance: Mat<f64>,
    /// Item locations (hierarchical mean plus deviation), J x P.
    pub beta: Mat<f64>,
    /// Hierarchical item standard deviations, G x P.
    pub item_sds: Mat<f64>,
    pub shared_extremity_location: f64,
}
