//! Shared test fixtures: synthetic page documents, a scripted recognizer,
//! and pixel-level assertions on flattened output.

pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;
