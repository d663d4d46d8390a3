// The persisted bias summary artifact.
//
// One JSON file per analysis session. The record carries no wall-clock
// data: re-saving an unchanged calculator must overwrite the file with
// identical bytes, and BTreeMap fields keep the key order stable.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// The full record of one calculation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiasSummary {
    pub model_name: String,
    /// Embedding dimensionality after any PCA reduction
    pub dimension: usize,
    pub pca_dimension: Option<usize>,
    pub neutral_tokens: usize,
    pub groups: Vec<GroupSummary>,
    pub excluded_words: Vec<String>,
    /// Whichever metrics were computed this session, keyed by metric name
    pub metrics: BTreeMap<String, f64>,
    pub entropy_per_group: BTreeMap<String, f64>,
    /// Group entropies normalized to z-scores, for cross-run comparison
    pub entropy_z_scores: BTreeMap<String, f64>,
}

/// One seed group as it resolved against the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name: String,
    pub seed_words: Vec<String>,
    pub tokens_matched: usize,
}

/// Write the summary to `<dir>/<model_name>-summary.json`, creating the
/// directory if needed. Returns the written path.
pub fn write_summary(summary: &BiasSummary, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let path = dir.join(format!("{}-summary.json", summary.model_name));
    let mut json = serde_json::to_string_pretty(summary).context("failed to encode summary")?;
    json.push('\n');
    fs::write(&path, json)
        .with_context(|| format!("failed to write summary to {}", path.display()))?;

    info!(path = %path.display(), "Saved bias summary");
    Ok(path)
}
