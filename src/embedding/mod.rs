// Embedding data model: the types that flow through the pipeline.
//
// These are separate from the file readers so the space and scoring modules
// can use them without depending on any particular activation format.

pub mod reader;

use serde::{Deserialize, Serialize};

/// One token occurrence with its embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Surface form, with sub-word markers already stripped
    pub word: String,
    /// Position of the token within its sentence
    pub position: usize,
    /// Index of the sentence the token came from
    pub line_num: usize,
    /// The embedding vector for this occurrence
    pub embedding: Vec<f64>,
}

/// One sentence worth of tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub tokens: Vec<Token>,
    pub line_num: usize,
}

/// Anything that can be flattened into a token list.
///
/// Both raw reader output (`Vec<Line>`) and already-flat token lists can
/// seed a `Space` this way.
pub trait TokenOperators {
    fn all_tokens(&self) -> Vec<Token>;
}

impl TokenOperators for Vec<Line> {
    fn all_tokens(&self) -> Vec<Token> {
        self.iter()
            .flat_map(|line| line.tokens.iter().cloned())
            .collect()
    }
}

impl TokenOperators for Vec<Token> {
    fn all_tokens(&self) -> Vec<Token> {
        self.clone()
    }
}
