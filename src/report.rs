//! Render posterior summaries to formatted tables.
//!
//! Purely observational output for the reporting collaborator; nothing here
//! feeds back into inference.

use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use crate::models::posterior::PosteriorSummary;

/// Formatted tables for one posterior summary.
#[derive(Debug)]
pub struct PosteriorTables {
    /// Off-diagonal latent-trait correlations.
    pub correlations: Table,
    /// Item hierarchy per (trait group, process): locations and scales.
    pub item_parameters: Table,
}

/// Render a posterior summary with `comfy_table`.
#[must_use]
pub fn render_posterior_tables(summary: &PosteriorSummary) -> PosteriorTables {
    let mut correlations = make_table(&["Pair", "Mean", "SD", "2.5%", "50%", "97.5%"]);
    for entry in &summary.correlations {
        correlations.add_row(vec![
            Cell::new(format!(
                "theta[{}] ~ theta[{}]",
                entry.first + 1,
                entry.second + 1
            )),
            Cell::new(format!("{:.3}", entry.summary.mean)),
            Cell::new(format!("{:.3}", entry.summary.std_dev)),
            Cell::new(format!("{:.3}", entry.summary.q025)),
            Cell::new(format!("{:.3}", entry.summary.q50)),
            Cell::new(format!("{:.3}", entry.summary.q975)),
        ]);
    }

    let mut item_parameters = make_table(&[
        "Group",
        "Process",
        "Location",
        "Loc 2.5%",
        "Loc 97.5%",
        "Scale",
    ]);
    for (mean_cell, sd_cell) in summary.item_means.iter().zip(summary.item_sds.iter()) {
        item_parameters.add_row(vec![
            Cell::new(mean_cell.group.to_string()),
            Cell::new(mean_cell.process.to_string()),
            Cell::new(format!("{:.3}", mean_cell.summary.mean)),
            Cell::new(format!("{:.3}", mean_cell.summary.q025)),
            Cell::new(format!("{:.3}", mean_cell.summary.q975)),
            Cell::new(format!("{:.3}", sd_cell.summary.mean)),
        ]);
    }

    PosteriorTables {
        correlations,
        item_parameters,
    }
}

fn make_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(*h)).collect::<Vec<_>>());
    table
}
