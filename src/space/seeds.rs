// Seed-word groups: the term sets that define a measured subspace.

use serde::{Deserialize, Serialize};

use crate::error::{CalculatorError, CalculatorResult};

/// A named group of seed words (e.g. "male" = [male, he, boy]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubspaceSeeds {
    pub name: String,
    pub seeds: Vec<String>,
}

impl SubspaceSeeds {
    pub fn new(name: impl Into<String>, seeds: Vec<String>) -> Self {
        Self {
            name: name.into(),
            seeds,
        }
    }

    /// Parse a CLI group argument.
    ///
    /// Accepts `label=word,word,...` or a bare comma list, in which case the
    /// group is named after its first word.
    pub fn parse_arg(arg: &str) -> CalculatorResult<Self> {
        let (label, words) = match arg.split_once('=') {
            Some((label, rest)) => (Some(label.trim()), rest),
            None => (None, arg),
        };

        let seeds: Vec<String> = words
            .split(',')
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        if seeds.is_empty() {
            return Err(CalculatorError::Config(format!(
                "seed group {arg:?} contains no words"
            )));
        }

        let name = match label {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => seeds[0].clone(),
        };

        Ok(Self { name, seeds })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.seeds.iter().any(|s| s == word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_list_names_after_first_word() {
        let group = SubspaceSeeds::parse_arg("male,he,boy").expect("parse");
        assert_eq!(group.name, "male");
        assert_eq!(group.seeds, vec!["male", "he", "boy"]);
    }

    #[test]
    fn parse_labeled_list() {
        let group = SubspaceSeeds::parse_arg("masculine=male,he,boy").expect("parse");
        assert_eq!(group.name, "masculine");
        assert_eq!(group.seeds.len(), 3);
    }

    #[test]
    fn parse_trims_whitespace_and_drops_empties() {
        let group = SubspaceSeeds::parse_arg(" she , her ,,girl ").expect("parse");
        assert_eq!(group.seeds, vec!["she", "her", "girl"]);
    }

    #[test]
    fn parse_empty_fails() {
        assert!(SubspaceSeeds::parse_arg("").is_err());
        assert!(SubspaceSeeds::parse_arg("label=").is_err());
    }

    #[test]
    fn contains_is_exact_match() {
        let group = SubspaceSeeds::new("g", vec!["he".to_string()]);
        assert!(group.contains("he"));
        assert!(!group.contains("she"));
        assert!(!group.contains("the"));
    }
}
