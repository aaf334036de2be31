use std::collections::{BTreeSet, HashMap};

use super::filter::TokenFilter;
use super::token::{START_TOKEN, Token};
use crate::error::{MarkovError, Result};

/// An ordered tuple of exactly `k` tokens, the lookup key of the chain.
pub type Context = Vec<Token>;

/// Order-`k` transition index built from a token sequence.
///
/// The `ChainIndex` maps every contiguous run of `k` tokens to the list of
/// tokens observed right after it. Duplicates in a follower list are
/// meaningful: they encode how often the transition was seen.
///
/// # Responsibilities
/// - Build the transition map and start set from a full sequence
/// - Answer follower lookups for a context
/// - Expose the clean sentence openers
///
/// # Invariants
/// - `order >= 1`
/// - Every key has exactly `order` tokens
/// - Every start context begins with `^` and only holds acceptable tokens
/// - The index is a pure function of (sequence, order, filter)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainIndex {
	/// Number of tokens in a context.
	order: usize,

	/// Context → followers, in sequence order.
	transitions: HashMap<Context, Vec<Token>>,

	/// Contexts that may open a generated sentence.
	starts: BTreeSet<Context>,
}

impl ChainIndex {
	/// Creates an empty index of order `order`.
	///
	/// # Errors
	/// Returns `InvalidChainOrder` if `order < 1` or a window of `order + 1`
	/// tokens cannot be sized.
	pub fn empty(order: usize) -> Result<Self> {
		if order < 1 || order.checked_add(1).is_none() {
			return Err(MarkovError::InvalidChainOrder(order));
		}
		Ok(Self { order, transitions: HashMap::new(), starts: BTreeSet::new() })
	}

	/// Builds the index from a full token sequence.
	///
	/// Slides a window of `order + 1` tokens with step 1: the first `order`
	/// tokens form the key, the last one is appended to its followers.
	/// A key joins the start set when it begins with `^` and the whole window
	/// passes `filter`.
	///
	/// Runs in O(n) over the sequence length.
	///
	/// # Errors
	/// Returns `InvalidChainOrder` if `order < 1` or `order == usize::MAX`.
	pub fn build(sequence: &[Token], order: usize, filter: &dyn TokenFilter) -> Result<Self> {
		let mut index = Self::empty(order)?;

		let width = order.checked_add(1).ok_or(MarkovError::InvalidChainOrder(order))?;
		for window in sequence.windows(width) {
			let Some((follower, context)) = window.split_last() else {
				continue;
			};

			match index.transitions.get_mut(context) {
				Some(followers) => followers.push(follower.clone()),
				None => {
					index.transitions.insert(context.to_vec(), vec![follower.clone()]);
				}
			}

			let opens_sentence = context.first().is_some_and(|token| token == START_TOKEN);
			if opens_sentence && window.iter().all(|token| filter.is_acceptable(token)) {
				index.starts.insert(context.to_vec());
			}
		}

		Ok(index)
	}

	/// Returns the chain order `k`.
	pub fn order(&self) -> usize {
		self.order
	}

	/// Returns the followers observed after `context`, with duplicates.
	pub fn followers(&self, context: &[Token]) -> Option<&[Token]> {
		self.transitions.get(context).map(Vec::as_slice)
	}

	/// Returns the clean sentence-opening contexts.
	pub fn start_contexts(&self) -> &BTreeSet<Context> {
		&self.starts
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}
}
