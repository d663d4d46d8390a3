// Plumbline: subspace bias metrics for transformer embedding layers.
//
// This is the library root. Each module corresponds to one stage of the
// load → partition → score → report pipeline.

pub mod config;
pub mod embedding;
pub mod error;
pub mod output;
pub mod scoring;
pub mod space;

/// The crate version string.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
