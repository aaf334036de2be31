use std::path::{Path, PathBuf};

use log::{debug, info};
use rand::Rng;

use super::chain::{ChainIndex, Context};
use super::corpus::{CorpusInput, CorpusStore, tokenize_file};
use super::filter::{AlphabetFilter, TokenFilter};
use super::generator::{GenerationEngine, GenerationState, render};
use super::request::GenerationRequest;
use super::sampler::{Doubling, Sampler, SeedTokens, SeedWeighting};
use super::token::Token;
use crate::config::ModelConfig;
use crate::io::is_plain_name;
use crate::error::{MarkovError, Result};

/// Dump name used when the caller does not give one.
pub const DEFAULT_DUMP_NAME: &str = "vocabularDump";

/// A variable-order Markov text model.
///
/// This struct manages:
/// - `corpus`: the full token sequence accumulated across updates
/// - `index`: the transition index and start set derived from `corpus`
/// - `filter` and `sampler`: the pluggable selection policies
///
/// # Invariants
/// - `index` is always `ChainIndex::build(corpus, config.chain_order, filter)`;
///   every mutation of `corpus` goes through `rebuild`
/// - `config` was validated at construction and never changes
pub struct MarkovModel {
	config: ModelConfig,
	corpus: CorpusStore,
	index: ChainIndex,
	filter: Box<dyn TokenFilter>,
	sampler: Sampler<Box<dyn SeedWeighting>>,
}

impl std::fmt::Debug for MarkovModel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MarkovModel")
			.field("order", &self.order())
			.field("tokens", &self.corpus.len())
			.field("contexts", &self.index.len())
			.field("starts", &self.index.start_contexts().len())
			.field("filter", &self.filter.id())
			.finish()
	}
}

impl MarkovModel {
	/// Creates an empty model of order `chain_order` with the default configuration.
	///
	/// # Errors
	/// Returns `InvalidChainOrder` if `chain_order < 1`.
	pub fn new(chain_order: usize) -> Result<Self> {
		Self::with_config(ModelConfig::with_order(chain_order))
	}

	/// Creates an empty model from a configuration.
	///
	/// Uses an `AlphabetFilter` over `config.alphabet` and `Doubling` capped
	/// by `config.max_doublings`.
	pub fn with_config(config: ModelConfig) -> Result<Self> {
		let filter = AlphabetFilter::new(&config.alphabet);
		let weighting = Doubling { max_doublings: config.max_doublings };
		Self::with_strategies(config, filter, weighting)
	}

	/// Creates an empty model with custom filter and weighting policies.
	pub fn with_strategies<F, W>(config: ModelConfig, filter: F, weighting: W) -> Result<Self>
	where
		F: TokenFilter + 'static,
		W: SeedWeighting + 'static,
	{
		config.validate()?;
		let index = ChainIndex::empty(config.chain_order)?;
		let weighting: Box<dyn SeedWeighting> = Box::new(weighting);
		Ok(Self {
			config,
			corpus: CorpusStore::new(),
			index,
			filter: Box::new(filter),
			sampler: Sampler::new(weighting),
		})
	}

	pub fn order(&self) -> usize {
		self.config.chain_order
	}

	pub fn config(&self) -> &ModelConfig {
		&self.config
	}

	/// The full token sequence (the snapshot content).
	pub fn tokens(&self) -> &[Token] {
		self.corpus.tokens()
	}

	pub fn index(&self) -> &ChainIndex {
		&self.index
	}

	/// Identifier of the active token filter.
	pub fn filter_id(&self) -> String {
		self.filter.id()
	}

	/// Appends new corpus data and rebuilds the index.
	///
	/// Returns the number of appended tokens; nothing is rebuilt when the
	/// input produced no token.
	pub fn update(&mut self, input: CorpusInput) -> Result<usize> {
		let tokens = input.into_tokens();
		if tokens.is_empty() {
			return Ok(0);
		}
		let added = self.corpus.append(tokens);
		self.rebuild()?;
		Ok(added)
	}

	/// Shorthand for `update(CorpusInput::Text(..))`.
	pub fn update_text(&mut self, text: &str) -> Result<usize> {
		self.update(CorpusInput::from(text))
	}

	/// Tokenizes a text file (see `tokenize_file`) and appends it.
	pub fn update_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
		let tokens = tokenize_file(path)?;
		self.update(CorpusInput::Tokens(tokens))
	}

	/// Replaces the whole token sequence and rebuilds the index.
	pub fn load_tokens(&mut self, tokens: Vec<Token>) -> Result<()> {
		self.corpus.replace(tokens);
		self.rebuild()
	}

	/// Recomputes the index from the stored sequence.
	fn rebuild(&mut self) -> Result<()> {
		self.index = ChainIndex::build(self.corpus.tokens(), self.config.chain_order, self.filter.as_ref())?;
		debug!(
			"rebuilt order-{} index: {} tokens, {} contexts, {} starts",
			self.order(),
			self.corpus.len(),
			self.index.len(),
			self.index.start_contexts().len()
		);
		Ok(())
	}

	/// Path of the JSON dump named `name` (default `vocabularDump`).
	///
	/// # Errors
	/// Returns `Config` if `name` is not a plain file name (separators, `..`).
	pub fn dump_path(&self, name: Option<&str>) -> Result<PathBuf> {
		let name = name.unwrap_or(DEFAULT_DUMP_NAME);
		if !is_plain_name(name) {
			return Err(MarkovError::Config(format!("invalid dump name {name:?}")));
		}
		Ok(self.config.dump_folder.join(format!("{name}.json")))
	}

	/// Saves the token sequence as a JSON snapshot and returns its path.
	pub fn dump(&self, name: Option<&str>) -> Result<PathBuf> {
		let path = self.dump_path(name)?;
		self.corpus.save_json(&path)?;
		Ok(path)
	}

	/// Replaces the current sequence with a JSON snapshot and rebuilds.
	///
	/// # Errors
	/// Returns `NotFound` if the dump does not exist; the model is unchanged.
	pub fn load_dump(&mut self, name: Option<&str>) -> Result<()> {
		let store = CorpusStore::load_json(self.dump_path(name)?)?;
		self.corpus = store;
		self.rebuild()?;
		info!("model restored with {} contexts", self.index.len());
		Ok(())
	}

	/// Picks a start context with the thread-local RNG.
	pub fn start_context<S: AsRef<str>>(&self, seed_words: &[S]) -> Result<Context> {
		self.start_context_with(&mut rand::rng(), seed_words)
	}

	/// Picks a start context, biased toward `seed_words`.
	///
	/// # Errors
	/// Returns `EmptyModel` if there is no clean start context.
	pub fn start_context_with<R: Rng + ?Sized, S: AsRef<str>>(&self, rng: &mut R, seed_words: &[S]) -> Result<Context> {
		let seeds = SeedTokens::new(seed_words);
		self.sampler.pick_start(self.index.start_contexts(), &seeds, rng).cloned()
	}

	/// Generates text with the thread-local RNG.
	pub fn generate(&self, request: &GenerationRequest) -> Result<String> {
		self.generate_with(&mut rand::rng(), request)
	}

	/// Generates text and renders it.
	///
	/// # Errors
	/// Returns `EmptyModel` if the model holds no data.
	pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R, request: &GenerationRequest) -> Result<String> {
		let tokens = self.generate_tokens_with(rng, request)?;
		Ok(render(&tokens))
	}

	/// Generates the raw token sequence (sentinels included).
	pub fn generate_tokens_with<R: Rng + ?Sized>(&self, rng: &mut R, request: &GenerationRequest) -> Result<Vec<Token>> {
		if self.index.is_empty() {
			return Err(MarkovError::EmptyModel);
		}

		let target = match request.size {
			Some(0) => None,
			Some(size) => Some(size),
			None => Some(rng.random_range(self.config.min_sentences..=self.config.max_sentences)),
		};
		let state = GenerationState::new(SeedTokens::new(&request.seed_words), target);
		let engine = GenerationEngine::new(&self.index, &self.sampler, self.filter.as_ref(), self.config.max_tokens);
		engine.run(state, rng)
	}
}
