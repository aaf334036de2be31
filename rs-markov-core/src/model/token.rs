use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;

/// An atomic unit of the generation alphabet: word, punctuation run or sentinel.
pub type Token = String;

/// Synthetic marker emitted before the first token of every sentence.
pub const START_TOKEN: &str = "^";

/// Synthetic marker emitted after the token that closes a sentence.
pub const END_TOKEN: &str = "$";

/// Characters forming punctuation runs.
pub const MARKS: &[char] = &['.', '!', '?', '…', ',', ';', ':'];

/// Subset of `MARKS` that closes a sentence.
pub const END_MARKS: &[char] = &['.', '!', '?', '…'];

// Literal patterns, compiling them cannot fail.
static WORD_OR_MARKS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\w+|[.!?…,;:]+").expect("valid token pattern"));
static WORDS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word pattern"));

/// Returns `true` for the two sentinels.
pub fn is_sentinel(token: &str) -> bool {
	token == START_TOKEN || token == END_TOKEN
}

/// Returns `true` if the token is a non-empty run of punctuation marks.
pub fn is_punctuation(token: &str) -> bool {
	!token.is_empty() && token.chars().all(|c| MARKS.contains(&c))
}

/// Returns `true` if the token contains a sentence-ending mark.
pub fn ends_sentence(token: &str) -> bool {
	token.contains(END_MARKS)
}

/// Returns `true` if the token contains at least one word character.
///
/// Used by the renderer to decide whether a token is preceded by a space.
pub fn has_word_chars(token: &str) -> bool {
	WORDS.is_match(token)
}

/// Tokenizes `text` into a lazy token stream.
///
/// The text is trimmed and lowercased, then scanned for maximal runs of word
/// characters or punctuation marks; anything else (quotes, dashes, emoji) is
/// skipped. Sentinels are inserted so that every sentence is wrapped as
/// `^ ... $`, and the stream always ends with `$`.
///
/// Example:
/// `"Кот спит. Кот ест рыбу!"` →
/// `^ кот спит . $ ^ кот ест рыбу ! $`
pub fn tokenize(text: &str) -> Tokens {
	Tokens {
		text: text.trim().to_lowercase(),
		position: 0,
		need_start: true,
		last_was_end: false,
		finished: false,
		pending: VecDeque::with_capacity(3),
	}
}

/// Extracts the word tokens of a seed word, normalized like corpus text.
///
/// Sentinels are never produced here, only `\w+` runs.
pub fn seed_tokens(word: &str) -> Vec<Token> {
	let word = word.trim().to_lowercase();
	WORDS.find_iter(&word).map(|m| m.as_str().to_owned()).collect()
}

/// Lazy iterator returned by [`tokenize`].
///
/// Owns the normalized text and walks it with `Regex::find_at`, so no token
/// is produced before it is requested.
#[derive(Debug)]
pub struct Tokens {
	text: String,
	position: usize,
	need_start: bool,
	last_was_end: bool,
	finished: bool,
	pending: VecDeque<Token>,
}

impl Iterator for Tokens {
	type Item = Token;

	fn next(&mut self) -> Option<Token> {
		loop {
			if let Some(token) = self.pending.pop_front() {
				self.last_was_end = token == END_TOKEN;
				return Some(token);
			}
			if self.finished {
				return None;
			}

			match WORD_OR_MARKS.find_at(&self.text, self.position) {
				Some(found) => {
					self.position = found.end();
					let token = found.as_str().to_owned();

					if self.need_start {
						self.need_start = false;
						self.pending.push_back(START_TOKEN.to_owned());
					}
					let closes = ends_sentence(&token);
					self.pending.push_back(token);
					if closes {
						self.need_start = true;
						self.pending.push_back(END_TOKEN.to_owned());
					}
				}
				None => {
					// A sentence must always close, even for an empty text.
					self.finished = true;
					if !self.last_was_end {
						self.pending.push_back(END_TOKEN.to_owned());
					}
				}
			}
		}
	}
}
