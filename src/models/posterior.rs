//! Posterior draw storage and summaries shared by both model families.

use faer::Mat;
use num_traits::ToPrimitive;

use crate::utils::usize_to_f64;

/// Transformed quantities recorded for one retained posterior sample.
#[derive(Debug, Clone)]
pub struct PosteriorDraw {
    /// Rescaled person traits, N x S.
    pub theta: Mat<f64>,
    /// Rescaled person covariance, S x S.
    pub covariance: Mat<f64>,
    /// Correlation matrix normalized from the rescaled covariance.
    pub correlation: Mat<f64>,
    /// Item locations, J x P.
    pub beta: Mat<f64>,
    /// Hierarchical item means by (trait group, process), G x P.
    pub item_means: Mat<f64>,
    /// Hierarchical item standard deviations by (trait group, process), G x P.
    pub item_sds: Mat<f64>,
    /// Predicted responses for the predictive subset, row-major N2 x J,
    /// categories in `1..=5`.
    pub predicted: Vec<u8>,
    pub predictive_persons: usize,
}

/// Posterior draw collection.
#[derive(Debug, Clone, Default)]
pub struct PosteriorSamples {
    pub draws: Vec<PosteriorDraw>,
}

impl PosteriorSamples {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn push(&mut self, draw: PosteriorDraw) {
        self.draws.push(draw);
    }
}

/// Scalar posterior summary statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub q025: f64,
    pub q50: f64,
    pub q975: f64,
}

/// Summary of one off-diagonal latent-trait correlation.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationSummary {
    /// Zero-based latent dimensions of the entry.
    pub first: usize,
    pub second: usize,
    pub summary: ParameterSummary,
}

/// Summary of one (trait group, process) cell of an item table.
#[derive(Debug, Clone, Copy)]
pub struct ItemCellSummary {
    /// 1-based trait group.
    pub group: usize,
    /// Zero-based process column.
    pub process: usize,
    pub summary: ParameterSummary,
}

/// Posterior summary over correlations and item hierarchy tables.
#[derive(Debug, Clone, Default)]
pub struct PosteriorSummary {
    pub correlations: Vec<CorrelationSummary>,
    pub item_means: Vec<ItemCellSummary>,
    pub item_sds: Vec<ItemCellSummary>,
    pub draw_count: usize,
}

/// Compute posterior summaries for the reporting-oriented blocks.
#[must_use]
pub fn summarize_posterior(samples: &PosteriorSamples) -> PosteriorSummary {
    let draw_count = samples.len();
    let Some(first_draw) = samples.draws.first() else {
        return PosteriorSummary {
            draw_count,
            ..PosteriorSummary::default()
        };
    };

    let latent = first_draw.correlation.ncols();
    let mut correlations = Vec::new();
    for first in 0..latent {
        for second in (first + 1)..latent {
            let values: Vec<f64> = samples
                .draws
                .iter()
                .map(|draw| draw.correlation[(first, second)])
                .collect();
            correlations.push(CorrelationSummary {
                first,
                second,
                summary: summarize_scalar(&values),
            });
        }
    }

    let groups = first_draw.item_means.nrows();
    let processes = first_draw.item_means.ncols();
    let mut item_means = Vec::new();
    let mut item_sds = Vec::new();
    for group in 0..groups {
        for process in 0..processes {
            let mean_values: Vec<f64> = samples
                .draws
                .iter()
                .map(|draw| draw.item_means[(group, process)])
                .collect();
            item_means.push(ItemCellSummary {
                group: group + 1,
                process,
                summary: summarize_scalar(&mean_values),
            });
            let sd_values: Vec<f64> = samples
                .draws
                .iter()
                .map(|draw| draw.item_sds[(group, process)])
                .collect();
            item_sds.push(ItemCellSummary {
                group: group + 1,
                process,
                summary: summarize_scalar(&sd_values),
            });
        }
    }

    PosteriorSummary {
        correlations,
        item_means,
        item_sds,
        draw_count,
    }
}

#[must_use]
fn summarize_scalar(values: &[f64]) -> ParameterSummary {
    if values.is_empty() {
        return ParameterSummary::default();
    }

    let n = usize_to_f64(values.len());
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|value| {
            let centered = value - mean;
            centered * centered
        })
        .sum::<f64>()
        / n.max(1.0);

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    ParameterSummary {
        mean,
        std_dev: variance.sqrt(),
        q025: percentile(&sorted, 0.025),
        q50: percentile(&sorted, 0.5),
        q975: percentile(&sorted, 0.975),
    }
}

#[must_use]
fn percentile(sorted_values: &[f64], probability: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }

    let clamped = probability.clamp(0.0, 1.0);
    let last = sorted_values.len() - 1;
    let position = clamped * usize_to_f64(last);
    let lower = position.floor().to_usize().unwrap_or(0);
    let upper = position.ceil().to_usize().unwrap_or(last);

    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = position - usize_to_f64(lower);
        (1.0 - weight).mul_add(sorted_values[lower], weight * sorted_values[upper])
    }
}
