//! # Survey inputs
//!
//! Defines the immutable observation container shared by all model families:
//! a person-by-item matrix of 5-point categorical responses plus per-item
//! keying metadata.
//!
//! # Examples
//!
//! ```
//! use ordinal_response_models::SurveyInput;
//!
//! let input = SurveyInput::new(
//!     2,
//!     2,
//!     vec![1, 5, 3, 2],
//!     vec![false, true],
//!     vec![1, 1],
//! );
//!
//! assert!(input.validate().is_ok());
//! assert_eq!(input.response(0, 1), 5);
//! ```

use thiserror::Error;

use crate::models::probability::CATEGORIES;

/// Errors returned when validating survey inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("survey must contain at least one person")]
    EmptyPersons,
    #[error("survey must contain at least one item")]
    EmptyItems,
    #[error("response matrix has {found} entries, expected {expected}")]
    ResponseLength { expected: usize, found: usize },
    #[error("response for person {person}, item {item} is {value}; categories are 1..=5")]
    CategoryOutOfRange { person: usize, item: usize, value: u8 },
    #[error("reversed-keying vector length ({len}) must equal item count ({items})")]
    ReversedLength { len: usize, items: usize },
    #[error("trait-group vector length ({len}) must equal item count ({items})")]
    TraitGroupLength { len: usize, items: usize },
    #[error("item {item} has trait group 0; groups are 1-based")]
    ZeroTraitGroup { item: usize },
    #[error("predictive person count ({requested}) exceeds person count ({persons})")]
    PredictiveCountTooLarge { requested: usize, persons: usize },
}

/// Immutable observed data for one survey: an N x J matrix of categorical
/// responses in `1..=5` (row-major, person-major) with per-item metadata.
///
/// `trait_group` labels are 1-based; the upper bound is model configuration
/// and is checked at model construction, not here.
#[derive(Debug, Clone)]
pub struct SurveyInput {
    pub n_persons: usize,
    pub n_items: usize,
    pub responses: Vec<u8>,
    pub reversed: Vec<bool>,
    pub trait_group: Vec<usize>,
    /// Number of leading persons included in posterior-predictive output.
    pub predictive_persons: usize,
}

impl SurveyInput {
    #[must_use]
    pub const fn new(
        n_persons: usize,
        n_items: usize,
        responses: Vec<u8>,
        reversed: Vec<bool>,
        trait_group: Vec<usize>,
    ) -> Self {
        Self {
            n_persons,
            n_items,
            responses,
            reversed,
            trait_group,
            predictive_persons: n_persons,
        }
    }

    /// Restrict posterior-predictive output to the first `count` persons.
    #[must_use]
    pub const fn with_predictive_persons(mut self, count: usize) -> Self {
        self.predictive_persons = count;
        self
    }

    /// Observed category for one person-item cell, in `1..=5`.
    #[must_use]
    pub fn response(&self, person: usize, item: usize) -> u8 {
        self.responses[person * self.n_items + item]
    }

    /// Zero-based index of the observed category, for probability lookups.
    #[must_use]
    pub fn category_index(&self, person: usize, item: usize) -> usize {
        usize::from(self.response(person, item)) - 1
    }

    /// Validate shapes and category ranges.
    ///
    /// # Errors
    ///
    /// Returns `InputError` naming the offending entry if the data are
    /// malformed.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.n_persons == 0 {
            return Err(InputError::EmptyPersons);
        }
        if self.n_items == 0 {
            return Err(InputError::EmptyItems);
        }
        let expected = self.n_persons * self.n_items;
        if self.responses.len() != expected {
            return Err(InputError::ResponseLength {
                expected,
                found: self.responses.len(),
            });
        }
        for person in 0..self.n_persons {
            for item in 0..self.n_items {
                let value = self.response(person, item);
                if value == 0 || usize::from(value) > CATEGORIES {
                    return Err(InputError::CategoryOutOfRange {
                        person,
                        item,
                        value,
                    });
                }
            }
        }
        if self.reversed.len() != self.n_items {
            return Err(InputError::ReversedLength {
                len: self.reversed.len(),
                items: self.n_items,
            });
        }
        if self.trait_group.len() != self.n_items {
            return Err(InputError::TraitGroupLength {
                len: self.trait_group.len(),
                items: self.n_items,
            });
        }
        if let Some(item) = self.trait_group.iter().position(|&group| group == 0) {
            return Err(InputError::ZeroTraitGroup { item });
        }
        if self.predictive_persons > self.n_persons {
            return Err(InputError::PredictiveCountTooLarge {
                requested: self.predictive_persons,
                persons: self.n_persons,
            });
        }
        Ok(())
    }
}
