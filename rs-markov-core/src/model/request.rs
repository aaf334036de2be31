use serde::Deserialize;

/// Per-call parameters of a generation.
///
/// # Fields
/// - `seed_words`: free text used to bias sampling, tokenized internally.
/// - `size`: number of sentences to produce.
///   - `None`: a random count in the configured range
///   - `Some(0)`: no sentence limit, stop at a dead end or the token cap
///   - `Some(n)`: stop after the `n`-th sentence end
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct GenerationRequest {
	#[serde(default)]
	pub seed_words: Vec<String>,
	#[serde(default)]
	pub size: Option<usize>,
}

impl GenerationRequest {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds one seed word.
	pub fn with_seed(mut self, word: impl Into<String>) -> Self {
		self.seed_words.push(word.into());
		self
	}

	/// Adds several seed words.
	pub fn with_seeds<I, S>(mut self, words: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.seed_words.extend(words.into_iter().map(Into::into));
		self
	}

	/// Sets the sentence count.
	pub fn with_size(mut self, size: usize) -> Self {
		self.size = Some(size);
		self
	}
}
