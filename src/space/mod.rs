// Vector spaces over embedding tokens.
//
// A Space is a named set of token occurrences: the full table, the neutral
// remainder after exclusions, or one seed group's subspace. The free
// functions at the bottom are the shared vector arithmetic; cosine and
// projection are the two alignment measures the calculator is built on.

pub mod pca;
pub mod seeds;

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::embedding::{Token, TokenOperators};
use crate::error::{CalculatorError, CalculatorResult};
use seeds::SubspaceSeeds;

/// A non-empty set of tokens with an optional defining seed group.
#[derive(Debug, Clone)]
pub struct Space {
    pub name: String,
    pub tokens: Vec<Token>,
    pub seeds: Option<SubspaceSeeds>,
}

impl Space {
    /// Build a space from anything token-shaped. Empty spaces are rejected:
    /// a centroid over zero tokens is meaningless.
    pub fn new<T: TokenOperators>(items: &T, seeds: Option<SubspaceSeeds>) -> CalculatorResult<Self> {
        let tokens = items.all_tokens();
        let name = match &seeds {
            Some(group) => group.name.clone(),
            None => "global".to_string(),
        };
        if tokens.is_empty() {
            return Err(CalculatorError::Config(format!(
                "space {name:?} contains no tokens"
            )));
        }
        Ok(Self { name, tokens, seeds })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Dimensionality of the embeddings (uniform across the space by the
    /// reader's invariant).
    pub fn dimension(&self) -> usize {
        self.tokens[0].embedding.len()
    }

    /// Mean embedding across all tokens in the space.
    pub fn centroid(&self) -> Vec<f64> {
        let dim = self.dimension();
        let mut sum = vec![0.0_f64; dim];
        for token in &self.tokens {
            for (i, &v) in token.embedding.iter().enumerate() {
                sum[i] += v;
            }
        }
        let n = self.tokens.len() as f64;
        for v in &mut sum {
            *v /= n;
        }
        sum
    }

    /// Per-dimension sample standard deviation around the centroid.
    /// Zero for single-token spaces.
    pub fn std_dev(&self) -> Vec<f64> {
        let dim = self.dimension();
        if self.tokens.len() < 2 {
            return vec![0.0; dim];
        }
        let centroid = self.centroid();
        let mut sq_sum = vec![0.0_f64; dim];
        for token in &self.tokens {
            for (i, &v) in token.embedding.iter().enumerate() {
                let d = v - centroid[i];
                sq_sum[i] += d * d;
            }
        }
        let denom = (self.tokens.len() - 1) as f64;
        sq_sum.iter().map(|s| (s / denom).sqrt()).collect()
    }

    /// All occurrences of the given words, in space order.
    pub fn find(&self, words: &[String]) -> Vec<Token> {
        self.tokens
            .iter()
            .filter(|t| words.contains(&t.word))
            .cloned()
            .collect()
    }

    /// Tokens whose word is not in the exclude set, in space order.
    pub fn neutral_tokens(&self, exclude: &HashSet<String>) -> Vec<Token> {
        self.tokens
            .iter()
            .filter(|t| !exclude.contains(&t.word))
            .cloned()
            .collect()
    }

    /// Sample up to `n` tokens without replacement using a seeded ChaCha8
    /// RNG, skipping excluded words. Deterministic for a fixed seed.
    pub fn sample(&self, n: usize, seed: u64, exclude: &[String]) -> Vec<Token> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut indices: Vec<usize> = (0..self.tokens.len()).collect();
        indices.shuffle(&mut rng);

        let mut sampled = Vec::with_capacity(n.min(self.tokens.len()));
        for i in indices {
            let token = &self.tokens[i];
            if exclude.iter().any(|w| w == &token.word) {
                continue;
            }
            sampled.push(token.clone());
            if sampled.len() == n {
                break;
            }
        }
        sampled
    }
}

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean norm.
pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// Cosine similarity in [-1, 1]. Returns 0.0 for zero or mismatched
/// vectors rather than propagating NaN into the metrics.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let denom = norm(a) * norm(b);
    if denom < f64::EPSILON {
        0.0
    } else {
        dot(a, b) / denom
    }
}

/// Scalar projection of `a` onto the direction of `b` (a · b̂).
/// Carries the magnitude of `a`, unlike cosine.
pub fn projection(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let b_norm = norm(b);
    if b_norm < f64::EPSILON {
        0.0
    } else {
        dot(a, b) / b_norm
    }
}
