use std::io;
use std::path::PathBuf;

/// Errors surfaced by the Markov text generator.
///
/// Every failure is propagated to the caller. Input errors (`NoText`,
/// `InvalidChainOrder`) are raised before any corpus state is touched.
#[derive(Debug, thiserror::Error)]
pub enum MarkovError {
	/// The chain order must be at least 1.
	#[error("a chain of order {0} is not allowed, order must be >= 1")]
	InvalidChainOrder(usize),

	/// Generation or start selection was requested with no data to use.
	#[error("the model is empty, supply corpus text first")]
	EmptyModel,

	/// Update was given something that is neither text nor a token list.
	#[error("no text supplied")]
	NoText,

	/// A snapshot or corpus file does not exist.
	#[error("file {0:?} not found")]
	NotFound(PathBuf),

	/// Invalid configuration value.
	#[error("invalid configuration: {0}")]
	Config(String),

	#[error(transparent)]
	Io(#[from] io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Binary(#[from] postcard::Error),
}

/// Shorthand used across the crate.
pub type Result<T> = std::result::Result<T, MarkovError>;
