use std::collections::HashMap;

use log::debug;

use super::token::Token;
use crate::error::Result;

/// Cache key: where the tokens come from and which filter they are meant for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VocabularyKey {
	pub source: String,
	pub filter: String,
}

impl VocabularyKey {
	pub fn new(source: impl Into<String>, filter: impl Into<String>) -> Self {
		Self { source: source.into(), filter: filter.into() }
	}
}

/// Token sequences already extracted from external sources.
///
/// Owned by the host, not by `MarkovModel`: a model only ever sees the
/// sequence handed to `load_tokens`.
#[derive(Debug, Default)]
pub struct VocabularyCache {
	entries: HashMap<VocabularyKey, Vec<Token>>,
}

impl VocabularyCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the cached sequence for `key`, running `loader` when the key is
	/// absent or `force_refresh` is set.
	///
	/// A failing loader leaves the previous entry in place.
	pub fn get_or_load<F>(&mut self, key: VocabularyKey, force_refresh: bool, loader: F) -> Result<&[Token]>
	where
		F: FnOnce() -> Result<Vec<Token>>,
	{
		if force_refresh || !self.entries.contains_key(&key) {
			let tokens = loader()?;
			debug!("vocabulary {:?} loaded with {} tokens", key, tokens.len());
			self.entries.insert(key.clone(), tokens);
		}
		Ok(self.entries.get(&key).map(Vec::as_slice).unwrap_or_default())
	}

	/// Drops one entry, returns `true` if it was present.
	pub fn invalidate(&mut self, key: &VocabularyKey) -> bool {
		self.entries.remove(key).is_some()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::MarkovError;
	use std::cell::Cell;

	fn words(items: &[&str]) -> Vec<Token> {
		items.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn loader_runs_once_until_refresh() {
		let mut cache = VocabularyCache::new();
		let calls = Cell::new(0);
		let key = VocabularyKey::new("chat:42", "alphabet:абв");
		let load = || {
			calls.set(calls.get() + 1);
			Ok(words(&["^", "а", "$"]))
		};

		assert_eq!(cache.get_or_load(key.clone(), false, load).unwrap().len(), 3);
		assert_eq!(cache.get_or_load(key.clone(), false, load).unwrap().len(), 3);
		assert_eq!(calls.get(), 1);

		cache.get_or_load(key, true, load).unwrap();
		assert_eq!(calls.get(), 2);
	}

	#[test]
	fn keys_differ_by_filter() {
		let mut cache = VocabularyCache::new();
		cache.get_or_load(VocabularyKey::new("src", "a"), false, || Ok(words(&["а"]))).unwrap();
		cache.get_or_load(VocabularyKey::new("src", "b"), false, || Ok(words(&["б"]))).unwrap();
		assert_eq!(cache.len(), 2);
	}

	#[test]
	fn failed_refresh_keeps_previous_entry() {
		let mut cache = VocabularyCache::new();
		let key = VocabularyKey::new("src", "f");
		cache.get_or_load(key.clone(), false, || Ok(words(&["а"]))).unwrap();

		let err = cache.get_or_load(key.clone(), true, || Err(MarkovError::NoText)).unwrap_err();
		assert!(matches!(err, MarkovError::NoText));
		assert_eq!(cache.get_or_load(key.clone(), false, || Ok(Vec::new())).unwrap(), &words(&["а"])[..]);
		assert!(cache.invalidate(&key));
		assert!(cache.is_empty());
	}
}
