// Output formatting: terminal display and persisted artifacts.

pub mod scatter;
pub mod summary;
pub mod terminal;
