use rand::SeedableRng;
use rand::rngs::StdRng;

use rs_markov_core::model::chain::ChainIndex;
use rs_markov_core::model::filter::AlphabetFilter;
use rs_markov_core::model::sampler::{Doubling, Sampler, SeedTokens};
use rs_markov_core::{CorpusInput, GenerationRequest, MarkovError, MarkovModel, ModelConfig};

const CORPUS: &str = "Кот спит. Кот ест рыбу!";

fn words(items: &[&str]) -> Vec<String> {
	items.iter().map(|s| s.to_string()).collect()
}

fn cat_model() -> MarkovModel {
	let mut model = MarkovModel::new(1).unwrap();
	model.update_text(CORPUS).unwrap();
	model
}

#[test]
fn corpus_tokens_and_start_set() {
	let model = cat_model();

	assert_eq!(model.tokens(), words(&["^", "кот", "спит", ".", "$", "^", "кот", "ест", "рыбу", "!", "$"]).as_slice());
	assert_eq!(model.index().start_contexts().len(), 1);
	assert!(model.index().start_contexts().contains(&words(&["^"])));
}

#[test]
fn generated_text_comes_from_the_corpus() {
	let model = cat_model();
	let mut rng = StdRng::seed_from_u64(42);

	for _ in 0..50 {
		let text = model.generate_with(&mut rng, &GenerationRequest::new().with_size(1)).unwrap();
		assert!(text == "Кот спит." || text == "Кот ест рыбу!", "unexpected {text:?}");
	}
}

#[test]
fn seed_on_follower_biases_the_continuation() {
	let model = cat_model();
	let mut rng = StdRng::seed_from_u64(2024);
	let request = GenerationRequest::new().with_seed("ест").with_size(1);

	let trials = 2000;
	let eats = (0..trials)
		.filter(|_| model.generate_with(&mut rng, &request).unwrap() == "Кот ест рыбу!")
		.count();
	// Weights 2 (ест) against 1 (спит).
	let ratio = eats as f64 / trials as f64;
	assert!((0.60..0.74).contains(&ratio), "ratio {ratio}");
}

// Seeding "рыбу" cannot lift "ест" after "кот" to a 70 % share: the weight
// only doubles for followers equal to a seed token, and neither "спит" nor
// "ест" is one. The exact doubling rule leaves this split even.
#[test]
fn seed_not_among_followers_keeps_frequencies() {
	let model = cat_model();
	let sampler = Sampler::<Doubling>::default();
	let filter = AlphabetFilter::russian();
	let followers = model.index().followers(&words(&["кот"])).unwrap();
	let seeds = SeedTokens::new(&["рыбу"]);
	let mut rng = StdRng::seed_from_u64(99);

	let trials = 2000;
	let eats = (0..trials)
		.filter(|_| sampler.pick_next(followers, &seeds, &filter, &mut rng).unwrap() == "ест")
		.count();
	let ratio = eats as f64 / trials as f64;
	assert!((0.44..0.56).contains(&ratio), "ratio {ratio}");
}

#[test]
fn seed_bias_is_monotonic_for_start_contexts() {
	let mut model = MarkovModel::new(2).unwrap();
	model.update_text("Кот спит. Пёс ест.").unwrap();
	let sampler = Sampler::<Doubling>::default();
	let starts = model.index().start_contexts();
	assert_eq!(starts.len(), 2);

	let cat = words(&["^", "кот"]);
	let dog = words(&["^", "пёс"]);
	let share = |seeds: &SeedTokens| {
		let cat_weight = sampler.start_weight(&cat, seeds).value();
		let dog_weight = sampler.start_weight(&dog, seeds).value();
		cat_weight / (cat_weight + dog_weight)
	};

	let uniform = 0.5;
	let once = share(&SeedTokens::new(&["кот"]));
	let twice = share(&SeedTokens::new(&["кот", "кот"]));
	assert!(once > uniform);
	assert!(twice > once);
	assert_eq!(sampler.start_weight(&cat, &SeedTokens::new(&["кот", "кот"])).value(), 4.0);

	// Only matching contexts are drawn once any context matches.
	let mut rng = StdRng::seed_from_u64(5);
	for _ in 0..20 {
		assert_eq!(model.start_context_with(&mut rng, &["кот"]).unwrap(), cat);
	}
}

#[test]
fn thousands_of_seed_matches_keep_the_bias() {
	let mut model = MarkovModel::new(2).unwrap();
	model.update_text("Кот спит. Пёс спит.").unwrap();
	let sampler = Sampler::<Doubling>::default();
	let filter = AlphabetFilter::russian();
	let followers = words(&["кот", "пёс"]);
	let seeds = vec!["кот"; 1100];
	let seed_tokens = SeedTokens::new(&seeds);
	let mut rng = StdRng::seed_from_u64(77);

	for _ in 0..2000 {
		let next = sampler.pick_next(&followers, &seed_tokens, &filter, &mut rng);
		assert_eq!(next.unwrap(), "кот");
	}
	for _ in 0..200 {
		assert_eq!(model.start_context_with(&mut rng, &seeds).unwrap(), words(&["^", "кот"]));
	}
}

#[test]
fn empty_model_cannot_generate() {
	let model = MarkovModel::new(1).unwrap();
	assert!(matches!(model.generate(&GenerationRequest::new()), Err(MarkovError::EmptyModel)));
	assert!(matches!(model.start_context(&["кот"]), Err(MarkovError::EmptyModel)));
}

#[test]
fn chain_order_must_be_positive() {
	assert!(matches!(MarkovModel::new(0), Err(MarkovError::InvalidChainOrder(0))));
	assert!(matches!(MarkovModel::new(usize::MAX), Err(MarkovError::InvalidChainOrder(usize::MAX))));
	for order in 1..5 {
		assert_eq!(MarkovModel::new(order).unwrap().order(), order);
	}
}

#[test]
fn rejected_input_does_not_touch_the_corpus() {
	let mut model = cat_model();
	let before = model.tokens().to_vec();

	let input = CorpusInput::try_from(serde_json::json!({ "body": "Пёс" }));
	assert!(matches!(input, Err(MarkovError::NoText)));
	assert_eq!(model.tokens(), before.as_slice());

	let added = model.update(CorpusInput::try_from(serde_json::json!("Пёс лает.")).unwrap()).unwrap();
	assert_eq!(added, 5);
}

#[test]
fn snapshot_round_trip_matches_a_fresh_build() {
	let folder = std::env::temp_dir().join(format!("rs-markov-e2e-{}", std::process::id()));
	let config = ModelConfig { chain_order: 2, dump_folder: folder.clone(), ..ModelConfig::default() };

	let mut model = MarkovModel::with_config(config.clone()).unwrap();
	model.update_text(CORPUS).unwrap();
	model.update_text("Рыбу ест кот, а пёс спит…").unwrap();
	model.dump(None).unwrap();

	let mut restored = MarkovModel::with_config(config).unwrap();
	restored.load_dump(None).unwrap();
	let fresh = ChainIndex::build(model.tokens(), 2, &AlphabetFilter::russian()).unwrap();
	assert_eq!(restored.index(), &fresh);

	let _ = std::fs::remove_dir_all(&folder);
}

#[test]
fn file_update_appends_every_line() {
	let folder = std::env::temp_dir().join(format!("rs-markov-file-{}", std::process::id()));
	std::fs::create_dir_all(&folder).unwrap();
	let file = folder.join("cats.txt");
	std::fs::write(&file, "Кот спит.\n\nКот ест рыбу!\n").unwrap();

	let mut model = MarkovModel::new(1).unwrap();
	model.update_from_file(&file).unwrap();
	assert_eq!(model.tokens(), cat_model().tokens());

	assert!(matches!(model.update_from_file(folder.join("none.txt")), Err(MarkovError::NotFound(_))));
	let _ = std::fs::remove_dir_all(&folder);
}
