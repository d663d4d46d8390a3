// ConceptX activation file reader.
//
// The input is JSON-lines: one object per sentence, each carrying the
// extracted hidden-state vectors for one layer:
//
//   {"linex_index": 0, "features": [
//       {"token": "he", "layers": [{"index": 3, "values": [0.1, ...]}]}]}
//
// Sub-word markers are stripped so seed words match surface forms: "##ing"
// (BERT continuation) and "Ġword" (RoBERTa space marker) both reduce to the
// bare word. Every vector in a file must share one dimensionality.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::info;

use super::{Line, Token};
use crate::error::{CalculatorError, CalculatorResult};

/// Trait for loading an embedding layer from a file.
///
/// ConceptX is the only format the pipeline consumes today; the trait is the
/// seam for adding others without touching the space and scoring modules.
pub trait EmbeddingReader {
    fn read(&self, path: &Path, show_progress: bool) -> CalculatorResult<Vec<Line>>;
}

#[derive(Debug, Deserialize)]
struct RawLine {
    linex_index: usize,
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    token: String,
    layers: Vec<RawLayer>,
}

#[derive(Debug, Deserialize)]
struct RawLayer {
    index: usize,
    values: Vec<f64>,
}

/// Reader for ConceptX-style JSON-lines activation files.
#[derive(Debug, Default)]
pub struct ConceptXReader;

impl ConceptXReader {
    pub fn new() -> Self {
        ConceptXReader
    }
}

impl EmbeddingReader for ConceptXReader {
    fn read(&self, path: &Path, show_progress: bool) -> CalculatorResult<Vec<Line>> {
        let file = File::open(path).map_err(|source| CalculatorError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let file_len = file
            .metadata()
            .map_err(|source| CalculatorError::Load {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        let pb = if show_progress {
            let pb = ProgressBar::new(file_len);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  Reading [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut lines: Vec<Line> = Vec::new();
        let mut dimension: Option<usize> = None;

        for (line_no, raw) in BufReader::new(file).lines().enumerate() {
            let raw = raw.map_err(|source| CalculatorError::Load {
                path: path.to_path_buf(),
                source,
            })?;
            pb.inc(raw.len() as u64 + 1);
            if raw.trim().is_empty() {
                continue;
            }

            let parsed: RawLine =
                serde_json::from_str(&raw).map_err(|e| CalculatorError::Parse {
                    path: path.to_path_buf(),
                    line: line_no + 1,
                    message: e.to_string(),
                })?;

            let mut tokens: Vec<Token> = Vec::new();
            for feature in parsed.features {
                let word = strip_subword_markers(&feature.token);
                for layer in feature.layers {
                    match dimension {
                        None => dimension = Some(layer.values.len()),
                        Some(d) if d != layer.values.len() => {
                            return Err(CalculatorError::Parse {
                                path: path.to_path_buf(),
                                line: line_no + 1,
                                message: format!(
                                    "embedding for {:?} has {} dimensions, expected {}",
                                    word,
                                    layer.values.len(),
                                    d
                                ),
                            });
                        }
                        Some(_) => {}
                    }
                    tokens.push(Token {
                        word: word.clone(),
                        position: layer.index,
                        line_num: parsed.linex_index,
                        embedding: layer.values,
                    });
                }
            }
            lines.push(Line {
                tokens,
                line_num: parsed.linex_index,
            });
        }

        pb.finish_and_clear();

        if lines.is_empty() {
            return Err(CalculatorError::Parse {
                path: path.to_path_buf(),
                line: 0,
                message: "file contains no embedding records".to_string(),
            });
        }

        info!(
            path = %path.display(),
            sentences = lines.len(),
            dimension = dimension.unwrap_or(0),
            "Loaded embedding layer"
        );

        Ok(lines)
    }
}

/// Strip BERT "##" continuation markers and the RoBERTa "Ġ" space marker.
fn strip_subword_markers(token: &str) -> String {
    token.replace("##", "").replace('Ġ', "")
}
