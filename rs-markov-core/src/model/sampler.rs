use std::collections::{BTreeSet, HashMap};

use log::warn;
use rand::Rng;
use rand::seq::{IndexedRandom, IteratorRandom};

use super::chain::Context;
use super::filter::TokenFilter;
use super::token::{Token, seed_tokens};
use crate::error::{MarkovError, Result};

/// A sampling weight stored as `scale * 2^doublings`.
///
/// Keeping the exponent apart lets any number of doublings stay exact:
/// a draw only compares weights relative to the largest exponent in its pool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Weight {
	pub scale: f64,
	pub doublings: u32,
}

impl Weight {
	pub fn new(scale: f64, doublings: u32) -> Self {
		Self { scale, doublings }
	}

	/// Absolute value; infinite once the exponent leaves the `f64` range.
	pub fn value(&self) -> f64 {
		self.scale * 2f64.powi(self.doublings.min(i32::MAX as u32) as i32)
	}

	/// Value divided by `2^top`, for `top >= self.doublings`.
	fn relative_to(&self, top: u32) -> f64 {
		let shift = top.saturating_sub(self.doublings).min(i32::MAX as u32) as i32;
		self.scale * 2f64.powi(-shift)
	}
}

/// Policy turning a base weight and a number of seed matches into a weight.
pub trait SeedWeighting: Send + Sync {
	fn boost(&self, base: f64, matches: u32) -> Weight;
}

impl<W: SeedWeighting + ?Sized> SeedWeighting for Box<W> {
	fn boost(&self, base: f64, matches: u32) -> Weight {
		(**self).boost(base, matches)
	}
}

/// Doubles the weight once per seed match.
///
/// With `max_doublings: None` the doubling is unbounded, so a seed word
/// repeated many times can dominate sampling. `Some(n)` stops after `n`
/// doublings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Doubling {
	pub max_doublings: Option<u32>,
}

impl SeedWeighting for Doubling {
	fn boost(&self, base: f64, matches: u32) -> Weight {
		let doublings = self.max_doublings.map_or(matches, |cap| matches.min(cap));
		Weight::new(base, doublings)
	}
}

/// Word tokens extracted from the caller's seed words.
///
/// Duplicates are kept: a token given twice counts as two matches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedTokens(Vec<Token>);

impl SeedTokens {
	/// Tokenizes every seed word the way corpus text is tokenized.
	pub fn new<S: AsRef<str>>(seed_words: &[S]) -> Self {
		Self(seed_words.iter().flat_map(|word| seed_tokens(word.as_ref())).collect())
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of seed tokens present anywhere in `context`.
	pub fn matches_in(&self, context: &[Token]) -> u32 {
		self.0.iter().filter(|seed| context.contains(seed)).count() as u32
	}

	/// Seed token → number of occurrences.
	fn counts(&self) -> HashMap<&str, u32> {
		let mut counts = HashMap::new();
		for seed in &self.0 {
			*counts.entry(seed.as_str()).or_insert(0) += 1;
		}
		counts
	}
}

/// Picks start contexts and next tokens, biased toward seed words.
///
/// # Responsibilities
/// - Uniform sampling when no seed is given (frequency comes from duplicates)
/// - Seed-weighted sampling through a `SeedWeighting` policy
/// - Falling back to uniform sampling when the weighted pool is empty
#[derive(Clone, Debug, Default)]
pub struct Sampler<W = Doubling> {
	weighting: W,
}

impl<W: SeedWeighting> Sampler<W> {
	pub fn new(weighting: W) -> Self {
		Self { weighting }
	}

	/// Weight of a start context: 1, boosted once per seed match inside it.
	pub fn start_weight(&self, context: &[Token], seeds: &SeedTokens) -> Weight {
		self.weighting.boost(1.0, seeds.matches_in(context))
	}

	/// Weighted pool used by `pick_next` when seeds are given.
	///
	/// Candidates are deduplicated in first-seen order and filtered; each
	/// weight is the occurrence count boosted once per equal seed token.
	/// Runs in one pass over `candidates`.
	pub fn next_weights<'a>(
		&self,
		candidates: &'a [Token],
		seeds: &SeedTokens,
		filter: &dyn TokenFilter,
	) -> Vec<(&'a Token, Weight)> {
		let mut order: Vec<&Token> = Vec::new();
		let mut counts: HashMap<&Token, usize> = HashMap::new();
		for candidate in candidates {
			let count = counts.entry(candidate).or_insert(0);
			if *count == 0 {
				order.push(candidate);
			}
			*count += 1;
		}

		let seed_counts = seeds.counts();
		order
			.into_iter()
			.filter(|candidate| filter.is_acceptable(candidate))
			.map(|candidate| {
				let matches = seed_counts.get(candidate.as_str()).copied().unwrap_or(0);
				(candidate, self.weighting.boost(counts[candidate] as f64, matches))
			})
			.collect()
	}

	/// Picks the context that opens a generated text.
	///
	/// - No seeds: uniform pick.
	/// - Seeds: only contexts with at least one match enter a weighted draw;
	///   if none matches, uniform pick over the whole set.
	///
	/// # Errors
	/// Returns `EmptyModel` if `starts` is empty.
	pub fn pick_start<'a, R: Rng + ?Sized>(
		&self,
		starts: &'a BTreeSet<Context>,
		seeds: &SeedTokens,
		rng: &mut R,
	) -> Result<&'a Context> {
		if starts.is_empty() {
			return Err(MarkovError::EmptyModel);
		}

		if !seeds.is_empty() {
			let pool: Vec<(&Context, Weight)> = starts
				.iter()
				.map(|context| (context, self.start_weight(context, seeds)))
				.filter(|(_, weight)| weight.doublings > 0)
				.collect();
			if let Some(context) = weighted_pick(&pool, rng) {
				return Ok(context);
			}
		}

		starts.iter().choose(rng).ok_or(MarkovError::EmptyModel)
	}

	/// Picks the next token among the observed followers.
	///
	/// - No seeds: uniform pick over the raw list, duplicates included.
	/// - Seeds: weighted pick over `next_weights`; if filtering removed every
	///   candidate, uniform pick over the raw list.
	///
	/// Returns `None` only if `candidates` is empty.
	pub fn pick_next<'a, R: Rng + ?Sized>(
		&self,
		candidates: &'a [Token],
		seeds: &SeedTokens,
		filter: &dyn TokenFilter,
		rng: &mut R,
	) -> Option<&'a Token> {
		if !seeds.is_empty() {
			let pool = self.next_weights(candidates, seeds, filter);
			if let Some(token) = weighted_pick(&pool, rng) {
				return Some(token);
			}
		}
		candidates.choose(rng)
	}
}

/// Weighted draw over `(item, weight)` pairs.
///
/// Weights are rescaled by the largest exponent in the pool before the draw,
/// so the ratios stay exact however many doublings were applied.
/// Returns `None` for an empty pool.
fn weighted_pick<'a, T: ?Sized, R: Rng + ?Sized>(pool: &[(&'a T, Weight)], rng: &mut R) -> Option<&'a T> {
	let top = pool.iter().map(|(_, weight)| weight.doublings).max()?;

	match pool.choose_weighted(rng, |(_, weight)| weight.relative_to(top)) {
		Ok((item, _)) => Some(*item),
		Err(err) => {
			warn!("weighted draw failed: {err}, sampling uniformly");
			pool.choose(rng).map(|(item, _)| *item)
		}
	}
}
