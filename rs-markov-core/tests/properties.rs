use proptest::prelude::*;

use rs_markov_core::model::chain::ChainIndex;
use rs_markov_core::model::corpus::CorpusStore;
use rs_markov_core::model::filter::AlphabetFilter;
use rs_markov_core::model::token::{START_TOKEN, tokenize};

fn corpus() -> impl Strategy<Value = String> {
	prop::collection::vec("(кот|пёс|ест|спит|рыбу|cat|42|[.,!?…])", 0..60).prop_map(|words| words.join(" "))
}

proptest! {
	#[test]
	fn rebuild_is_pure(text in corpus(), order in 1usize..4) {
		let sequence: Vec<String> = tokenize(&text).collect();
		let filter = AlphabetFilter::russian();

		let first = ChainIndex::build(&sequence, order, &filter).unwrap();
		let second = ChainIndex::build(&sequence, order, &filter).unwrap();
		prop_assert_eq!(first, second);
	}

	#[test]
	fn snapshot_restores_the_same_index(text in corpus(), order in 1usize..4) {
		let store = CorpusStore::from_tokens(tokenize(&text).collect());
		let filter = AlphabetFilter::russian();

		let restored = CorpusStore::from_json(&store.to_json().unwrap()).unwrap();
		prop_assert_eq!(
			ChainIndex::build(restored.tokens(), order, &filter).unwrap(),
			ChainIndex::build(store.tokens(), order, &filter).unwrap()
		);
	}

	#[test]
	fn start_contexts_are_clean(text in corpus(), order in 1usize..4) {
		let sequence: Vec<String> = tokenize(&text).collect();
		let filter = AlphabetFilter::russian();
		let index = ChainIndex::build(&sequence, order, &filter).unwrap();

		for context in index.start_contexts() {
			prop_assert_eq!(context.len(), order);
			prop_assert_eq!(context[0].as_str(), START_TOKEN);
			prop_assert!(!context.iter().any(|token| token == "cat" || token == "42"));
		}
	}
}
