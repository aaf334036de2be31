use std::collections::VecDeque;

use rand::Rng;

use super::chain::ChainIndex;
use super::filter::TokenFilter;
use super::sampler::{Sampler, SeedTokens, SeedWeighting};
use super::token::{END_TOKEN, START_TOKEN, Token, has_word_chars};
use crate::error::{MarkovError, Result};

/// Phase of a single generation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	/// No start context chosen yet.
	Start,
	/// Tokens are being appended one step at a time.
	Extending,
	/// Terminal: target reached, dead end, or token cap hit.
	Done,
}

/// Transient state of one generation call.
///
/// # Invariants
/// - `window` never holds more than `k` tokens
/// - `output` starts with the chosen start context
/// - Once `phase` is `Done` it never changes again
#[derive(Clone, Debug)]
pub struct GenerationState {
	phase: Phase,
	/// Last `k` tokens, the current lookup key.
	window: VecDeque<Token>,
	/// Every token produced so far, sentinels included.
	output: Vec<Token>,
	/// Number of `$` produced while extending.
	sentences: usize,
	/// Sentence count that ends generation; `None` means no limit.
	target: Option<usize>,
	seeds: SeedTokens,
}

impl GenerationState {
	pub fn new(seeds: SeedTokens, target: Option<usize>) -> Self {
		Self {
			phase: Phase::Start,
			window: VecDeque::new(),
			output: Vec::new(),
			sentences: 0,
			target,
			seeds,
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn output(&self) -> &[Token] {
		&self.output
	}

	pub fn sentences(&self) -> usize {
		self.sentences
	}

	/// Consumes the state and returns the produced tokens.
	pub fn into_output(self) -> Vec<Token> {
		self.output
	}
}

/// Drives the sampler over a chain index.
///
/// The engine itself holds no per-call data: everything that changes from
/// step to step lives in the `GenerationState` passed by `&mut`.
pub struct GenerationEngine<'m, W> {
	index: &'m ChainIndex,
	sampler: &'m Sampler<W>,
	filter: &'m dyn TokenFilter,
	max_tokens: usize,
}

impl<'m, W: SeedWeighting> GenerationEngine<'m, W> {
	pub fn new(
		index: &'m ChainIndex,
		sampler: &'m Sampler<W>,
		filter: &'m dyn TokenFilter,
		max_tokens: usize,
	) -> Self {
		Self { index, sampler, filter, max_tokens }
	}

	/// Start → Extending: picks the start context and seeds window and output.
	///
	/// # Errors
	/// Returns `EmptyModel` if the index has no start context.
	pub fn begin<R: Rng + ?Sized>(&self, state: &mut GenerationState, rng: &mut R) -> Result<()> {
		if state.phase != Phase::Start {
			return Ok(());
		}
		let start = self.sampler.pick_start(self.index.start_contexts(), &state.seeds, rng)?;

		state.window = start.iter().cloned().collect();
		state.output = start.clone();
		state.phase = Phase::Extending;
		Ok(())
	}

	/// Performs one extending step and returns the produced token.
	///
	/// Returns `None` once the state is `Done` (or was never started).
	pub fn step<R: Rng + ?Sized>(&self, state: &mut GenerationState, rng: &mut R) -> Option<Token> {
		if state.phase != Phase::Extending {
			return None;
		}
		if state.output.len() >= self.max_tokens {
			state.phase = Phase::Done;
			return None;
		}

		let followers = match self.index.followers(state.window.make_contiguous()) {
			Some(followers) => followers,
			None => {
				// Dead end, the chain is exhausted.
				state.phase = Phase::Done;
				return None;
			}
		};
		let next = match self.sampler.pick_next(followers, &state.seeds, self.filter, rng) {
			Some(token) => token.clone(),
			None => {
				state.phase = Phase::Done;
				return None;
			}
		};

		if state.window.len() >= self.index.order() {
			state.window.pop_front();
		}
		state.window.push_back(next.clone());
		state.output.push(next.clone());

		if next == END_TOKEN {
			state.sentences += 1;
			if state.target.is_some_and(|target| state.sentences >= target) {
				state.phase = Phase::Done;
			}
		}
		Some(next)
	}

	/// Runs a full generation and returns the produced tokens.
	///
	/// # Errors
	/// Returns `EmptyModel` if the index is empty or has no start context.
	pub fn run<R: Rng + ?Sized>(&self, mut state: GenerationState, rng: &mut R) -> Result<Vec<Token>> {
		if self.index.is_empty() {
			return Err(MarkovError::EmptyModel);
		}
		self.begin(&mut state, rng)?;
		while self.step(&mut state, rng).is_some() {}
		Ok(state.into_output())
	}
}

/// Renders generated tokens into display text.
///
/// - `^` is invisible and capitalizes the next word
/// - `$` is invisible
/// - Punctuation is glued to the previous token
/// - Words are separated by a single space
pub fn render(tokens: &[Token]) -> String {
	let mut text = String::new();
	let mut capitalize = true;

	for token in tokens {
		match token.as_str() {
			START_TOKEN => capitalize = true,
			END_TOKEN => (),
			mark if !has_word_chars(mark) => text.push_str(mark),
			word => {
				text.push(' ');
				if capitalize {
					capitalize = false;
					let mut chars = word.chars();
					if let Some(first) = chars.next() {
						text.extend(first.to_uppercase());
						text.push_str(chars.as_str());
					}
				} else {
					text.push_str(word);
				}
			}
		}
	}

	text.trim().to_owned()
}
