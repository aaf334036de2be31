use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MarkovError, Result};
use crate::io;

/// Lowercase Russian alphabet, the default target alphabet for word tokens.
pub const RUSSIAN_ALPHABET: &str = "абвгдежзийклмнопрстуфхцчшщъыьэюяё";

/// Name of the folder (under the home directory) where dumps are stored by default.
pub const DEFAULT_DUMP_FOLDER: &str = "textGeneratorTemp";

/// Configuration of a `MarkovModel`.
///
/// Every field has a default, so a JSON file only needs the keys it overrides:
///
/// ```json
/// { "chain_order": 3, "max_sentences": 2 }
/// ```
///
/// # Invariants (checked by `validate`)
/// - `chain_order >= 1`
/// - `1 <= min_sentences <= max_sentences`
/// - `max_tokens >= 1`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
	/// Number of preceding tokens used as lookup context.
	pub chain_order: usize,

	/// Lower bound of the random sentence count used when a request has no size.
	pub min_sentences: usize,

	/// Upper bound (inclusive) of the random sentence count.
	pub max_sentences: usize,

	/// Hard cap on the number of tokens produced by a single generation.
	pub max_tokens: usize,

	/// Letters accepted in word tokens.
	pub alphabet: String,

	/// Optional cap on the number of seed doublings applied to one candidate.
	/// `None` keeps the doubling unbounded.
	pub max_doublings: Option<u32>,

	/// Folder holding JSON dumps.
	pub dump_folder: PathBuf,
}

impl Default for ModelConfig {
	fn default() -> Self {
		Self {
			chain_order: 2,
			min_sentences: 1,
			max_sentences: 5,
			max_tokens: 10_000,
			alphabet: RUSSIAN_ALPHABET.to_owned(),
			max_doublings: None,
			dump_folder: io::home_folder().join(DEFAULT_DUMP_FOLDER),
		}
	}
}

impl ModelConfig {
	/// Default configuration with a given chain order.
	pub fn with_order(chain_order: usize) -> Self {
		Self { chain_order, ..Self::default() }
	}

	/// Reads a configuration from a JSON file and validates it.
	///
	/// # Errors
	/// - `NotFound` if the file does not exist
	/// - `Config` if the JSON is malformed or a value is out of range
	///   (a negative chain order ends up here, it cannot be stored in `usize`)
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		if !path.is_file() {
			return Err(MarkovError::NotFound(path.to_path_buf()));
		}
		let contents = std::fs::read_to_string(path)?;
		Self::from_json(&contents)
	}

	/// Parses a configuration from a JSON string and validates it.
	pub fn from_json(contents: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(contents)
			.map_err(|e| MarkovError::Config(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	/// Checks the invariants listed on the type.
	pub fn validate(&self) -> Result<()> {
		if self.chain_order < 1 || self.chain_order == usize::MAX {
			return Err(MarkovError::InvalidChainOrder(self.chain_order));
		}
		if self.min_sentences < 1 || self.min_sentences > self.max_sentences {
			return Err(MarkovError::Config(format!(
				"sentence range {}..={} is invalid",
				self.min_sentences, self.max_sentences
			)));
		}
		if self.max_tokens < 1 {
			return Err(MarkovError::Config("max_tokens must be >= 1".to_owned()));
		}
		Ok(())
	}
}
