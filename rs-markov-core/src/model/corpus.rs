use std::path::Path;
use std::thread;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::token::{Token, tokenize};
use crate::error::{MarkovError, Result};
use crate::io::{build_output_path, read_lines, write_with_backup};

/// Data accepted by an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CorpusInput {
	/// Raw text, tokenized on update.
	Text(String),
	/// Pre-tokenized sequence (e.g. a snapshot), appended as-is.
	Tokens(Vec<Token>),
}

impl From<&str> for CorpusInput {
	fn from(text: &str) -> Self {
		CorpusInput::Text(text.to_owned())
	}
}

impl From<String> for CorpusInput {
	fn from(text: String) -> Self {
		CorpusInput::Text(text)
	}
}

impl From<Vec<Token>> for CorpusInput {
	fn from(tokens: Vec<Token>) -> Self {
		CorpusInput::Tokens(tokens)
	}
}

impl TryFrom<serde_json::Value> for CorpusInput {
	type Error = MarkovError;

	/// Accepts a JSON string (text) or an array of strings (tokens).
	///
	/// # Errors
	/// Returns `NoText` for any other shape, including arrays holding
	/// non-string items.
	fn try_from(value: serde_json::Value) -> Result<Self> {
		match value {
			serde_json::Value::String(text) => Ok(CorpusInput::Text(text)),
			serde_json::Value::Array(items) => items
				.into_iter()
				.map(|item| match item {
					serde_json::Value::String(token) => Ok(token),
					_ => Err(MarkovError::NoText),
				})
				.collect::<Result<Vec<_>>>()
				.map(CorpusInput::Tokens),
			_ => Err(MarkovError::NoText),
		}
	}
}

impl CorpusInput {
	/// Turns the input into tokens.
	pub fn into_tokens(self) -> Vec<Token> {
		match self {
			CorpusInput::Text(text) => tokenize(&text).collect(),
			CorpusInput::Tokens(tokens) => tokens,
		}
	}
}

/// Append-only store of the full token sequence.
///
/// The snapshot of a store is the exact ordered token list, sentinels
/// included, with no other metadata.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct CorpusStore {
	tokens: Vec<Token>,
}

impl CorpusStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_tokens(tokens: Vec<Token>) -> Self {
		Self { tokens }
	}

	/// Appends tokens at the end of the sequence and returns how many were added.
	pub fn append(&mut self, tokens: Vec<Token>) -> usize {
		let added = tokens.len();
		self.tokens.extend(tokens);
		added
	}

	/// Replaces the whole sequence.
	pub fn replace(&mut self, tokens: Vec<Token>) {
		self.tokens = tokens;
	}

	pub fn tokens(&self) -> &[Token] {
		&self.tokens
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	/// Serializes the snapshot as a JSON array of strings.
	pub fn to_json(&self) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec(&self.tokens)?)
	}

	pub fn from_json(bytes: &[u8]) -> Result<Self> {
		Ok(Self { tokens: serde_json::from_slice(bytes)? })
	}

	/// Serializes the snapshot with `postcard` (compact local cache).
	pub fn to_binary(&self) -> Result<Vec<u8>> {
		Ok(postcard::to_stdvec(&self.tokens)?)
	}

	pub fn from_binary(bytes: &[u8]) -> Result<Self> {
		Ok(Self { tokens: postcard::from_bytes(bytes)? })
	}

	/// Writes the JSON snapshot to `path` through a `.backup` file.
	pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		write_with_backup(&path, &self.to_json()?)?;
		info!("saved {} tokens to {}", self.len(), path.as_ref().display());
		Ok(())
	}

	/// Reads a JSON snapshot.
	///
	/// # Errors
	/// Returns `NotFound` if `path` is not a file.
	pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		if !path.is_file() {
			return Err(MarkovError::NotFound(path.to_path_buf()));
		}
		let store = Self::from_json(&std::fs::read(path)?)?;
		info!("loaded {} tokens from {}", store.len(), path.display());
		Ok(store)
	}
}

/// Tokenizes a text file line by line.
///
/// - Empty lines are skipped; every line is a self-closing text.
/// - Lines are split into chunks (CPU cores * factor) tokenized on worker
///   threads; chunks are joined back in file order.
/// - A `postcard` cache (`<stem>.bin`) next to the file is reused when it is
///   newer than the file, and written otherwise.
///
/// # Errors
/// Returns `NotFound` if `path` is not a file.
pub fn tokenize_file<P: AsRef<Path>>(path: P) -> Result<Vec<Token>> {
	let path = path.as_ref();
	if !path.is_file() {
		return Err(MarkovError::NotFound(path.to_path_buf()));
	}

	let cache_path = build_output_path(path, "bin")?;
	if is_fresh_cache(path, &cache_path) {
		let store = CorpusStore::from_binary(&std::fs::read(&cache_path)?)?;
		debug!("using token cache {}", cache_path.display());
		return Ok(store.tokens);
	}

	let lines = read_lines(path)?;
	let tokens = tokenize_lines(&lines, |line| tokenize(line).collect())?;

	let store = CorpusStore::from_tokens(tokens);
	std::fs::write(&cache_path, store.to_binary()?)?;
	info!("tokenized {} lines of {} into {} tokens", lines.len(), path.display(), store.len());
	Ok(store.tokens)
}

/// Tokenizes `lines` on worker threads, one chunk per thread, keeping order.
///
/// Chunk count is CPU cores * 8.
///
/// # Errors
/// Returns `Io` if a worker panicked; no partial sequence is returned.
fn tokenize_lines<F>(lines: &[String], tokenize_line: F) -> Result<Vec<Token>>
where
	F: Fn(&str) -> Vec<Token> + Sync,
{
	let cpus = num_cpus::get();
	let factor = 8;
	let chunks = cpus * factor;
	let chunk_size = lines.len().div_ceil(chunks).max(1);
	let tokenize_line = &tokenize_line;

	let results: Vec<thread::Result<Vec<Token>>> = thread::scope(|scope| {
		let handles: Vec<_> = lines
			.chunks(chunk_size)
			.map(|chunk| scope.spawn(move || chunk.iter().flat_map(|line| tokenize_line(line)).collect::<Vec<Token>>()))
			.collect();

		handles.into_iter().map(|handle| handle.join()).collect()
	});

	let mut tokens = Vec::new();
	for result in results {
		let chunk = result.map_err(|_| std::io::Error::other("tokenizer worker panicked"))?;
		tokens.extend(chunk);
	}
	Ok(tokens)
}

/// `true` if `cache` exists and is at least as recent as `source`.
fn is_fresh_cache(source: &Path, cache: &Path) -> bool {
	let modified = |path: &Path| std::fs::metadata(path).and_then(|m| m.modified()).ok();
	match (modified(source), modified(cache)) {
		(Some(source), Some(cache)) => cache >= source,
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn json_values_map_to_inputs() {
		assert_eq!(
			CorpusInput::try_from(json!("Кот спит.")).unwrap(),
			CorpusInput::Text("Кот спит.".to_owned())
		);
		assert_eq!(
			CorpusInput::try_from(json!(["^", "кот", "$"])).unwrap(),
			CorpusInput::Tokens(vec!["^".to_owned(), "кот".to_owned(), "$".to_owned()])
		);
	}

	#[test]
	fn non_text_json_is_rejected() {
		for value in [json!(42), json!(null), json!({ "text": "кот" }), json!(["кот", 1])] {
			assert!(matches!(CorpusInput::try_from(value), Err(MarkovError::NoText)));
		}
	}

	#[test]
	fn snapshot_is_a_plain_json_array() {
		let store = CorpusStore::from_tokens(vec!["^".to_owned(), "кот".to_owned(), "$".to_owned()]);
		let json = String::from_utf8(store.to_json().unwrap()).unwrap();
		assert_eq!(json, r#"["^","кот","$"]"#);
		assert_eq!(CorpusStore::from_json(json.as_bytes()).unwrap(), store);
	}

	#[test]
	fn binary_cache_restores_tokens() {
		let store = CorpusStore::from_tokens(vec!["^".to_owned(), "ёж".to_owned(), "$".to_owned()]);
		assert_eq!(CorpusStore::from_binary(&store.to_binary().unwrap()).unwrap(), store);
	}

	#[test]
	fn append_keeps_order() {
		let mut store = CorpusStore::new();
		assert_eq!(store.append(vec!["^".to_owned(), "а".to_owned()]), 2);
		assert_eq!(store.append(vec!["$".to_owned()]), 1);
		assert_eq!(store.tokens(), &["^".to_owned(), "а".to_owned(), "$".to_owned()]);
	}

	#[test]
	fn missing_snapshot_is_not_found() {
		let err = CorpusStore::load_json("/no/such/dump.json").unwrap_err();
		assert!(matches!(err, MarkovError::NotFound(_)));
	}

	#[test]
	fn panicking_worker_fails_the_whole_file() {
		let lines: Vec<String> = (0..64).map(|i| format!("строка {i}")).collect();

		let result = tokenize_lines(&lines, |line| {
			if line == "строка 42" {
				panic!("bad line");
			}
			tokenize(line).collect()
		});
		assert!(matches!(result, Err(MarkovError::Io(_))));

		let tokens = tokenize_lines(&lines, |line| tokenize(line).collect()).unwrap();
		let expected: Vec<Token> = lines.iter().flat_map(|line| tokenize(line)).collect();
		assert_eq!(tokens, expected);
	}

	#[test]
	fn file_tokens_follow_line_order_and_are_cached() {
		let folder = std::env::temp_dir().join(format!("rs-markov-corpus-{}", std::process::id()));
		std::fs::create_dir_all(&folder).unwrap();
		let file = folder.join("corpus.txt");
		let lines: Vec<String> = (0..200).map(|i| format!("строка {}", i)).collect();
		std::fs::write(&file, lines.join("\n\n")).unwrap();

		let tokens = tokenize_file(&file).unwrap();
		let expected: Vec<Token> = lines.iter().flat_map(|line| tokenize(line)).collect();
		assert_eq!(tokens, expected);
		assert!(folder.join("corpus.bin").exists());
		assert_eq!(tokenize_file(&file).unwrap(), expected);

		let _ = std::fs::remove_dir_all(&folder);
	}
}
