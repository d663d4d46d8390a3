// Runtime configuration.
//
// Two layers: `Config` pulls output locations from the environment (with a
// .env file loaded at startup), and `CalculatorConfig` is the explicit
// construction record: every option the calculator takes, with its default,
// validated before any file is touched.

use std::env;
use std::path::PathBuf;

use crate::error::{CalculatorError, CalculatorResult};
use crate::space::seeds::SubspaceSeeds;

/// Environment-driven settings.
pub struct Config {
    /// Where summary and scatter artifacts land (PLUMBLINE_OUT_DIR).
    pub out_dir: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self {
            out_dir: env::var("PLUMBLINE_OUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./output")),
        }
    }
}

/// Everything needed to construct a `BiasCalculator`.
#[derive(Debug, Clone)]
pub struct CalculatorConfig {
    /// Path to the activation file (required)
    pub path: PathBuf,
    /// Seed groups defining the measured subspaces (required, at least two)
    pub subspace_seeds: Vec<SubspaceSeeds>,
    /// Words excluded from the neutral space, beyond the seed words
    /// themselves (default: empty)
    pub exclude_words: Vec<String>,
    /// Show progress bars and colored output (default: false)
    pub user_friendly: bool,
    /// Reduce embeddings to this many dimensions before scoring
    /// (default: no reduction)
    pub pca_dimension: Option<usize>,
    /// Display name used in output artifacts (default: the input file stem)
    pub model_name: Option<String>,
}

impl CalculatorConfig {
    pub fn new(path: impl Into<PathBuf>, subspace_seeds: Vec<SubspaceSeeds>) -> Self {
        Self {
            path: path.into(),
            subspace_seeds,
            exclude_words: Vec::new(),
            user_friendly: false,
            pca_dimension: None,
            model_name: None,
        }
    }

    /// Check the seed/exclude configuration before loading anything.
    ///
    /// Bias is measured between groups, so fewer than two groups (or any
    /// empty group) is a configuration error, as is a zero PCA target.
    pub fn validate(&self) -> CalculatorResult<()> {
        if self.subspace_seeds.is_empty() {
            return Err(CalculatorError::Config(
                "no seed groups given; at least two are required".to_string(),
            ));
        }
        if self.subspace_seeds.len() < 2 {
            return Err(CalculatorError::Config(format!(
                "only one seed group ({:?}) given; bias is measured between at least two",
                self.subspace_seeds[0].name
            )));
        }
        for group in &self.subspace_seeds {
            if group.seeds.is_empty() {
                return Err(CalculatorError::Config(format!(
                    "seed group {:?} is empty",
                    group.name
                )));
            }
        }
        let mut names: Vec<&str> = self.subspace_seeds.iter().map(|g| g.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.subspace_seeds.len() {
            return Err(CalculatorError::Config(
                "seed group names must be unique".to_string(),
            ));
        }
        if self.pca_dimension == Some(0) {
            return Err(CalculatorError::Config(
                "pca dimension must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Name used in artifact filenames and display.
    pub fn resolved_model_name(&self) -> String {
        match &self.model_name {
            Some(name) => name.clone(),
            None => self
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "model".to_string()),
        }
    }
}
