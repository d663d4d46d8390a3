// Subspace bias calculator.
//
// Construction partitions a loaded embedding table into one subspace per
// seed group plus the neutral remainder, then precomputes each neutral
// token's alignment with every group centroid. Two alignment measures feed
// the metrics:
//
//   projection: token · unit-centroid. Carries the token's magnitude, so
//   scaling the whole table scales the metric with it.
//   cosine: the scale-free counterpart and preferred reporting form.
//
// A metric is the mean over neutral tokens of the mean over unordered group
// pairs of the (signed or absolute) alignment difference. The signed form
// answers "which group does the layer lean toward" (its sign follows the
// group order); the absolute form answers "how far apart are the groups at
// all", so opposing leans cannot cancel out across tokens.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::info;

use crate::config::CalculatorConfig;
use crate::embedding::reader::{ConceptXReader, EmbeddingReader};
use crate::embedding::Token;
use crate::error::{CalculatorError, CalculatorResult};
use crate::output::summary::{self, BiasSummary, GroupSummary};
use crate::scoring::normalize::z_score_normalize;
use crate::space::{cosine, pca, projection, Space};

pub const METRIC_BIAS_SUM_AVERAGE: &str = "bias_sum_average";
pub const METRIC_BIAS_ASB_SUM_AVERAGE: &str = "bias_asb_sum_average";
pub const METRIC_NORM_AVG_BIAS: &str = "norm_avg_bias";
pub const METRIC_NORM_AVG_ASB_BIAS: &str = "norm_avg_asb_bias";

/// One neutral token's alignment with every group centroid.
#[derive(Debug, Clone)]
struct TokenAlignment {
    word: String,
    /// token · unit-centroid, in group order
    projections: Vec<f64>,
    /// cosine(token, centroid), in group order
    cosines: Vec<f64>,
    /// softmax over the cosines; feeds the entropy report
    softmax: Vec<f64>,
}

/// Computes bias metrics for one embedding layer against a fixed seed
/// configuration. Metric methods record their results so `save_summary`
/// persists exactly what was computed this session.
#[derive(Debug, Clone)]
pub struct BiasCalculator {
    model_name: String,
    groups: Vec<GroupSummary>,
    excluded_words: Vec<String>,
    pca_dimension: Option<usize>,
    dimension: usize,
    alignments: Vec<TokenAlignment>,
    computed: BTreeMap<String, f64>,
}

impl BiasCalculator {
    /// Load, partition, and precompute alignments per the config.
    pub fn from_config(config: &CalculatorConfig) -> CalculatorResult<Self> {
        config.validate()?;

        let data = ConceptXReader::new().read(&config.path, config.user_friendly)?;
        let mut tokens: Vec<Token> = data.iter().flat_map(|l| l.tokens.clone()).collect();
        if tokens.is_empty() {
            return Err(CalculatorError::Parse {
                path: config.path.clone(),
                line: 0,
                message: "file contains no tokens".to_string(),
            });
        }
        info!(tokens = tokens.len(), "Flattened embedding table");

        if let Some(dim) = config.pca_dimension {
            pca::reduce_tokens(&mut tokens, dim)?;
            info!(dimension = dim, "Reduced embeddings with PCA");
        }

        let global = Space::new(&tokens, None)?;

        let mut sub_spaces: Vec<Space> = Vec::with_capacity(config.subspace_seeds.len());
        for group in &config.subspace_seeds {
            let members = global.find(&group.seeds);
            if members.is_empty() {
                return Err(CalculatorError::Config(format!(
                    "seed group {:?} matches no tokens in {}",
                    group.name,
                    config.path.display()
                )));
            }
            sub_spaces.push(Space::new(&members, Some(group.clone()))?);
        }

        // The neutral space drops the user's exclude list and every seed
        // word, so group members never score against themselves.
        let mut exclude: HashSet<String> = config.exclude_words.iter().cloned().collect();
        for group in &config.subspace_seeds {
            exclude.extend(group.seeds.iter().cloned());
        }
        let neutral_tokens = global.neutral_tokens(&exclude);
        if neutral_tokens.is_empty() {
            return Err(CalculatorError::Config(
                "no neutral tokens remain after exclusion".to_string(),
            ));
        }
        let neutral = Space::new(&neutral_tokens, None)?;

        let mut calculator =
            Self::from_spaces(config.resolved_model_name(), &neutral, &sub_spaces)?;
        calculator.excluded_words = config.exclude_words.clone();
        calculator.pca_dimension = config.pca_dimension;
        Ok(calculator)
    }

    /// Build a calculator from already-partitioned spaces.
    ///
    /// `neutral` holds the tokens being scored; `groups` are the subspaces
    /// whose centroids define the measured directions.
    pub fn from_spaces(
        model_name: String,
        neutral: &Space,
        groups: &[Space],
    ) -> CalculatorResult<Self> {
        if groups.len() < 2 {
            return Err(CalculatorError::Config(format!(
                "bias needs at least two subspaces, got {}",
                groups.len()
            )));
        }

        let centroids: Vec<Vec<f64>> = groups.iter().map(|g| g.centroid()).collect();

        let alignments: Vec<TokenAlignment> = neutral
            .tokens
            .par_iter()
            .map(|token| align(token, &centroids))
            .collect();

        let group_summaries = groups
            .iter()
            .map(|g| GroupSummary {
                name: g.name.clone(),
                seed_words: g.seeds.as_ref().map(|s| s.seeds.clone()).unwrap_or_default(),
                tokens_matched: g.len(),
            })
            .collect();

        info!(
            model = %model_name,
            groups = groups.len(),
            neutral_tokens = neutral.len(),
            "Prepared bias calculator"
        );

        Ok(Self {
            model_name,
            groups: group_summaries,
            excluded_words: Vec::new(),
            pca_dimension: None,
            dimension: neutral.dimension(),
            alignments,
            computed: BTreeMap::new(),
        })
    }

    /// Signed projection bias: mean pairwise alignment difference.
    /// Scales proportionally with the embedding magnitudes.
    pub fn bias_sum_average(&mut self) -> f64 {
        let value = self.aggregate(false, false);
        self.record(METRIC_BIAS_SUM_AVERAGE, value)
    }

    /// Absolute projection bias: opposing leans cannot cancel.
    pub fn bias_asb_sum_average(&mut self) -> f64 {
        let value = self.aggregate(false, true);
        self.record(METRIC_BIAS_ASB_SUM_AVERAGE, value)
    }

    /// Signed cosine bias, invariant under uniform scaling of the table.
    pub fn norm_avg_bias(&mut self) -> f64 {
        let value = self.aggregate(true, false);
        self.record(METRIC_NORM_AVG_BIAS, value)
    }

    /// Absolute cosine bias, invariant under uniform scaling of the table.
    pub fn norm_avg_asb_bias(&mut self) -> f64 {
        let value = self.aggregate(true, true);
        self.record(METRIC_NORM_AVG_ASB_BIAS, value)
    }

    fn aggregate(&self, normalized: bool, absolute: bool) -> f64 {
        let total: f64 = self
            .alignments
            .iter()
            .map(|a| {
                let values = if normalized { &a.cosines } else { &a.projections };
                pairwise_mean_diff(values, absolute)
            })
            .sum();
        total / self.alignments.len() as f64
    }

    fn record(&mut self, name: &str, value: f64) -> f64 {
        self.computed.insert(name.to_string(), value);
        value
    }

    /// Per-occurrence softmax entropy, in table order. High entropy means
    /// the token sits evenly between the groups; low entropy means it leans.
    pub fn entropy_per_token(&self) -> Vec<(String, f64)> {
        self.alignments
            .iter()
            .map(|a| {
                let entropy: f64 = a.softmax.iter().map(|&p| entropy_term(p)).sum();
                (a.word.clone(), entropy)
            })
            .collect()
    }

    /// Mean entropy contribution per group across all neutral tokens.
    pub fn entropy_per_group(&self) -> BTreeMap<String, f64> {
        let mut totals: BTreeMap<String, f64> =
            self.groups.iter().map(|g| (g.name.clone(), 0.0)).collect();
        for alignment in &self.alignments {
            for (group, &p) in self.groups.iter().zip(alignment.softmax.iter()) {
                if let Some(total) = totals.get_mut(&group.name) {
                    *total += entropy_term(p);
                }
            }
        }
        let n = self.alignments.len() as f64;
        for total in totals.values_mut() {
            *total /= n;
        }
        totals
    }

    /// Metrics recorded so far this session, keyed by metric name.
    pub fn computed_metrics(&self) -> &BTreeMap<String, f64> {
        &self.computed
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn neutral_token_count(&self) -> usize {
        self.alignments.len()
    }

    /// Assemble the persistent summary for the current session state.
    pub fn summary(&self) -> BiasSummary {
        let entropy_per_group = self.entropy_per_group();
        let entropy_values: Vec<f64> = entropy_per_group.values().copied().collect();
        let z_scores = z_score_normalize(&entropy_values);
        let entropy_z_scores = entropy_per_group
            .keys()
            .cloned()
            .zip(z_scores)
            .collect::<BTreeMap<String, f64>>();

        BiasSummary {
            model_name: self.model_name.clone(),
            dimension: self.dimension,
            pca_dimension: self.pca_dimension,
            neutral_tokens: self.alignments.len(),
            groups: self.groups.clone(),
            excluded_words: self.excluded_words.clone(),
            metrics: self.computed.clone(),
            entropy_per_group,
            entropy_z_scores,
        }
    }

    /// Write the session summary to `<dir>/<model_name>-summary.json`.
    /// Re-saving unchanged state overwrites with identical bytes.
    pub fn save_summary(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        summary::write_summary(&self.summary(), dir)
    }
}

fn align(token: &Token, centroids: &[Vec<f64>]) -> TokenAlignment {
    let projections: Vec<f64> = centroids
        .iter()
        .map(|c| projection(&token.embedding, c))
        .collect();
    let cosines: Vec<f64> = centroids
        .iter()
        .map(|c| cosine(&token.embedding, c))
        .collect();
    let softmax = softmax(&cosines);
    TokenAlignment {
        word: token.word.clone(),
        projections,
        cosines,
        softmax,
    }
}

/// Mean over unordered pairs (i < j) of `values[i] - values[j]`, optionally
/// absolute.
fn pairwise_mean_diff(values: &[f64], absolute: bool) -> f64 {
    let k = values.len();
    let pairs = k * (k - 1) / 2;
    if pairs == 0 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..k {
        for j in (i + 1)..k {
            let diff = values[i] - values[j];
            sum += if absolute { diff.abs() } else { diff };
        }
    }
    sum / pairs as f64
}

/// Max-shifted softmax.
fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp_sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
    values.iter().map(|v| (v - max).exp() / exp_sum).collect()
}

fn entropy_term(p: f64) -> f64 {
    if p > 0.0 {
        -(p * p.log2())
    } else {
        0.0
    }
}
