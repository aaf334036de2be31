use rs_markov_core::{CorpusInput, GenerationRequest, MarkovError, MarkovModel, ModelConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=debug to see index rebuilds
    env_logger::init();

    // A chain order of 0 is not allowed
    match MarkovModel::new(0) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Order 0 refused: {e}"),
    }

    // Chain order 1: the next word depends on the previous token only.
    // Dumps go to ./dumps instead of ~/textGeneratorTemp
    let config = ModelConfig {
        chain_order: 1,
        dump_folder: "./dumps".into(),
        ..ModelConfig::default()
    };
    let mut model = MarkovModel::with_config(config)?;

    // Generating before any update fails with EmptyModel
    if let Err(MarkovError::EmptyModel) = model.generate(&GenerationRequest::new()) {
        println!("Nothing to generate from yet");
    }

    // Every update is tokenized, appended and the index rebuilt.
    // Load a whole text file with `update_from_file("./data/corpus.txt")`
    model.update_text("Кот спит. Кот ест рыбу!")?;
    model.update_text("Пёс спит на солнце. Пёс ест кость, а кот смотрит.")?;
    model.update(CorpusInput::Text("Рыбу любит кот… Кость любит пёс!".to_owned()))?;

    println!("{} tokens, {} contexts", model.tokens().len(), model.index().len());

    // No seed and no size: 1 to 5 sentences, uniformly sampled
    for i in 0..3 {
        println!("Generated text {}: {}", i + 1, model.generate(&GenerationRequest::new())?);
    }

    // Seed words double the weight of every matching candidate
    let request = GenerationRequest::new().with_seed("рыбу").with_size(2);
    for i in 0..3 {
        println!("Seeded text {}: {}", i + 1, model.generate(&request)?);
    }

    // The snapshot is the token list only; reloading rebuilds the index
    let path = model.dump(Some("exemple"))?;
    println!("Dump written to {}", path.display());

    let mut restored = MarkovModel::with_config(model.config().clone())?;
    restored.load_dump(Some("exemple"))?;
    println!("Restored: {}", restored.generate(&GenerationRequest::new().with_size(1))?);

    // A missing dump is reported, not treated as empty
    match restored.load_dump(Some("missing")) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("{e}"),
    }

    Ok(())
}
