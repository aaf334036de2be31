use std::collections::BTreeSet;

use super::token::{ends_sentence, is_punctuation, is_sentinel};
use crate::config::RUSSIAN_ALPHABET;

/// Decides whether a token may be used for generation.
///
/// Rejected tokens stay in the transition index, but they are never offered
/// as sentence openers and are dropped from seeded candidate pools.
pub trait TokenFilter: Send + Sync {
	/// Returns `true` if the token is acceptable.
	fn is_acceptable(&self, token: &str) -> bool;

	/// Stable identifier of the filter, used as part of cache keys.
	fn id(&self) -> String {
		std::any::type_name::<Self>().to_owned()
	}
}

impl<F> TokenFilter for F
where
	F: Fn(&str) -> bool + Send + Sync,
{
	fn is_acceptable(&self, token: &str) -> bool {
		self(token)
	}
}

/// Accepts words made entirely of letters of one alphabet, punctuation runs
/// and sentinels.
///
/// # Invariants
/// - Letters are stored lowercase (tokens are lowercased by the tokenizer)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlphabetFilter {
	letters: BTreeSet<char>,
}

impl AlphabetFilter {
	/// Creates a filter for the given alphabet.
	pub fn new(alphabet: &str) -> Self {
		Self { letters: alphabet.chars().flat_map(char::to_lowercase).collect() }
	}

	/// Filter for the Russian alphabet (`а`..`я` and `ё`).
	pub fn russian() -> Self {
		Self::new(RUSSIAN_ALPHABET)
	}

	/// Returns `true` if the token is a non-empty word of the target alphabet.
	pub fn is_word(&self, token: &str) -> bool {
		!token.is_empty() && token.chars().flat_map(char::to_lowercase).all(|c| self.letters.contains(&c))
	}
}

impl Default for AlphabetFilter {
	fn default() -> Self {
		Self::russian()
	}
}

impl TokenFilter for AlphabetFilter {
	fn is_acceptable(&self, token: &str) -> bool {
		self.is_word(token) || is_punctuation(token) || ends_sentence(token) || is_sentinel(token)
	}

	fn id(&self) -> String {
		format!("alphabet:{}", self.letters.iter().collect::<String>())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn russian_filter_accepts_words_marks_and_sentinels() {
		let filter = AlphabetFilter::russian();
		for token in ["кот", "ёжик", "Рыбу", ",", "?!", "…", "^", "$"] {
			assert!(filter.is_acceptable(token), "{token} should be accepted");
		}
	}

	#[test]
	fn russian_filter_rejects_noise() {
		let filter = AlphabetFilter::russian();
		for token in ["cat", "42", "кот42", "кот_пёс", ""] {
			assert!(!filter.is_acceptable(token), "{token} should be rejected");
		}
	}

	#[test]
	fn closures_are_filters() {
		let only_short = |token: &str| token.chars().count() <= 3;
		assert!(only_short.is_acceptable("кот"));
		assert!(!only_short.is_acceptable("рыбу"));
	}

	#[test]
	fn id_depends_on_alphabet() {
		assert_ne!(AlphabetFilter::new("abc").id(), AlphabetFilter::russian().id());
		assert_eq!(AlphabetFilter::new("cba").id(), AlphabetFilter::new("abc").id());
	}
}
