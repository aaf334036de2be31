//! Top-level module for the Markov text generation system.
//!
//! This module provides a variable-order, word-level Markov chain, including:
//! - Tokenization with sentence sentinels (`token`)
//! - Pluggable token acceptability (`filter`)
//! - The order-k transition index (`chain`)
//! - Seed-biased weighted sampling (`sampler`)
//! - The generation state machine and renderer (`generator`)
//! - Corpus accumulation and snapshots (`corpus`)
//! - A facade tying everything together (`markov_model`)

/// Order-k transition index and start set.
pub mod chain;

/// Append-only token store, JSON snapshots and the binary token cache.
pub mod corpus;

/// Token acceptability predicates.
pub mod filter;

/// Start → Extending → Done generation loop and text rendering.
pub mod generator;

/// High-level model: update, load, dump and generate.
pub mod markov_model;

/// Per-call generation parameters.
pub mod request;

/// Weighted selection of start contexts and next tokens.
pub mod sampler;

/// Tokenizer and token classification helpers.
pub mod token;

/// Host-owned cache of token sequences.
pub mod vocabulary;
