//! Word-level Markov chain text generation library.
//!
//! This crate provides:
//! - A tokenizer producing words, punctuation runs and sentence sentinels
//! - A variable-order transition index rebuilt from the full token sequence
//! - Weighted generation biased toward caller-supplied seed words
//! - JSON snapshots of the token sequence and a binary token cache
//!
//! Most callers only need `MarkovModel` and `GenerationRequest`.

/// Model configuration (chain order, sentence range, alphabet, dump folder).
pub mod config;

/// Error type shared by the whole crate.
pub mod error;

/// File helpers: line reading, path building, backup writes.
pub mod io;

/// Tokenizer, chain index, sampler and generation engine.
pub mod model;

pub use config::ModelConfig;
pub use error::{MarkovError, Result};
pub use model::corpus::CorpusInput;
pub use model::markov_model::MarkovModel;
pub use model::request::GenerationRequest;
