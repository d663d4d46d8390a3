// 2-D scatter artifact for embedding visualization.
//
// A seeded random sample of the table is projected onto its first two
// principal components and written as JSON. Points that belong to a seed
// group are tagged with the group name so a plot can color them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::space::pca::{embedding_matrix, Pca};
use crate::space::seeds::SubspaceSeeds;
use crate::space::Space;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub word: String,
    pub x: f64,
    pub y: f64,
    /// Seed group the word belongs to, if any
    pub group: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatterPlot {
    pub model_name: String,
    pub sample_size: usize,
    pub seed: u64,
    pub points: Vec<ScatterPoint>,
}

/// Sample `n` tokens, project to 2-D, and tag seed-group membership.
pub fn project_sample(
    space: &Space,
    n: usize,
    seed: u64,
    groups: &[SubspaceSeeds],
) -> Result<Vec<ScatterPoint>> {
    let sample = space.sample(n, seed, &[]);
    if sample.len() < n {
        warn!(
            requested = n,
            sampled = sample.len(),
            "Sample size exceeds table, using every token"
        );
    }
    if sample.len() < 2 {
        anyhow::bail!("need at least 2 tokens to project, got {}", sample.len());
    }

    let matrix = embedding_matrix(&sample);
    let pca = Pca::fit(&matrix, 2)?;
    let projected = pca.transform(&matrix);

    let points = sample
        .iter()
        .zip(projected.row_iter())
        .map(|(token, row)| ScatterPoint {
            word: token.word.clone(),
            x: row[0],
            y: row[1],
            group: groups
                .iter()
                .find(|g| g.contains(&token.word))
                .map(|g| g.name.clone()),
        })
        .collect();

    Ok(points)
}

/// Write the scatter artifact to `<dir>/<model_name>-scatter.json`.
pub fn write_scatter(plot: &ScatterPlot, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let path = dir.join(format!("{}-scatter.json", plot.model_name));
    let mut json = serde_json::to_string_pretty(plot).context("failed to encode scatter plot")?;
    json.push('\n');
    fs::write(&path, json)
        .with_context(|| format!("failed to write scatter plot to {}", path.display()))?;

    info!(path = %path.display(), points = plot.points.len(), "Saved scatter plot");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Token;

    fn token(word: &str, embedding: Vec<f64>) -> Token {
        Token {
            word: word.to_string(),
            position: 0,
            line_num: 0,
            embedding,
        }
    }

    fn sample_space() -> Space {
        Space::new(
            &vec![
                token("he", vec![1.0, 0.0, 0.0]),
                token("she", vec![0.0, 1.0, 0.0]),
                token("doctor", vec![1.0, 1.0, 0.5]),
                token("nurse", vec![0.5, 1.0, 1.0]),
            ],
            None,
        )
        .expect("space")
    }

    #[test]
    fn projects_requested_sample_to_two_dimensions() {
        let points = project_sample(&sample_space(), 3, 1, &[]).expect("project");
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn tags_seed_group_membership() {
        let groups = vec![
            SubspaceSeeds::new("male", vec!["he".to_string()]),
            SubspaceSeeds::new("female", vec!["she".to_string()]),
        ];
        let points = project_sample(&sample_space(), 4, 1, &groups).expect("project");

        let he = points.iter().find(|p| p.word == "he").expect("he sampled");
        assert_eq!(he.group.as_deref(), Some("male"));
        let doctor = points
            .iter()
            .find(|p| p.word == "doctor")
            .expect("doctor sampled");
        assert!(doctor.group.is_none());
    }

    #[test]
    fn deterministic_for_fixed_seed() {
        let a = project_sample(&sample_space(), 3, 9, &[]).expect("project");
        let b = project_sample(&sample_space(), 3, 9, &[]).expect("project");
        let words_a: Vec<&str> = a.iter().map(|p| p.word.as_str()).collect();
        let words_b: Vec<&str> = b.iter().map(|p| p.word.as_str()).collect();
        assert_eq!(words_a, words_b);
        for (p, q) in a.iter().zip(b.iter()) {
            assert_eq!(p.x, q.x);
            assert_eq!(p.y, q.y);
        }
    }

    #[test]
    fn oversized_sample_uses_whole_table() {
        let points = project_sample(&sample_space(), 100, 1, &[]).expect("project");
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn writes_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let plot = ScatterPlot {
            model_name: "layer12".to_string(),
            sample_size: 3,
            seed: 1,
            points: project_sample(&sample_space(), 3, 1, &[]).expect("project"),
        };
        let path = write_scatter(&plot, dir.path()).expect("write");
        assert_eq!(path.file_name().unwrap(), "layer12-scatter.json");
        let json = fs::read_to_string(&path).expect("read");
        let back: ScatterPlot = serde_json::from_str(&json).expect("decode");
        assert_eq!(back.points.len(), 3);
    }
}
