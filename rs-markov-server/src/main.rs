use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, post, put, web};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use rs_markov_core::io::{get_filename, is_plain_name, list_files, normalize_folder};
use rs_markov_core::model::corpus::tokenize_file;
use rs_markov_core::model::vocabulary::{VocabularyCache, VocabularyKey};
use rs_markov_core::{CorpusInput, GenerationRequest, MarkovError, MarkovModel, ModelConfig};

/// Environment variable holding the path of the JSON server configuration.
const CONFIG_ENV: &str = "RS_MARKOV_CONFIG";

/// Server configuration, read from the file named by `RS_MARKOV_CONFIG`.
///
/// ```json
/// { "port": 5000, "data_folder": "./data", "model": { "chain_order": 2 } }
/// ```
#[derive(Deserialize, Debug)]
#[serde(default)]
struct ServerConfig {
	host: String,
	port: u16,
	/// Folder holding the `.txt` corpora served by `/v1/vocabulary`.
	data_folder: String,
	model: ModelConfig,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_owned(),
			port: 5000,
			data_folder: "./data".to_owned(),
			model: ModelConfig::default(),
		}
	}
}

impl ServerConfig {
	fn load() -> Result<Self, Box<dyn std::error::Error>> {
		let Some(path) = std::env::var_os(CONFIG_ENV) else {
			return Ok(Self::default());
		};
		let contents = std::fs::read_to_string(&path)?;
		let config: Self = serde_json::from_str(&contents)?;
		config.model.validate()?;
		Ok(config)
	}
}

/// Query parameters of `/v1/generate`.
#[derive(Deserialize)]
struct GenerateParams {
	/// Comma separated seed words.
	seed: Option<String>,
	size: Option<usize>,
}

impl GenerateParams {
	fn request(&self) -> GenerationRequest {
		let seeds = self
			.seed
			.as_deref()
			.unwrap_or_default()
			.split(',')
			.map(str::trim)
			.filter(|s| !s.is_empty());
		let request = GenerationRequest::new().with_seeds(seeds);
		match self.size {
			Some(size) => request.with_size(size),
			None => request,
		}
	}
}

#[derive(Deserialize)]
struct DumpQuery {
	name: Option<String>,
}

#[derive(Deserialize)]
struct VocabularyQuery {
	source: Option<String>,
	refresh: Option<bool>,
}

#[derive(Serialize)]
struct Stats {
	order: usize,
	tokens: usize,
	contexts: usize,
	starts: usize,
}

/// Everything behind the lock: generation and mutation never overlap.
struct SharedData {
	model: MarkovModel,
	vocabularies: VocabularyCache,
	data_folder: PathBuf,
}

/// Maps a core error to an HTTP response.
fn error_response(err: MarkovError) -> HttpResponse {
	match err {
		MarkovError::NoText | MarkovError::InvalidChainOrder(_) | MarkovError::Config(_) => {
			HttpResponse::BadRequest().body(err.to_string())
		}
		MarkovError::NotFound(_) => HttpResponse::NotFound().body(err.to_string()),
		MarkovError::EmptyModel => HttpResponse::Conflict().body(err.to_string()),
		err => {
			error!("request failed: {err}");
			HttpResponse::InternalServerError().body(err.to_string())
		}
	}
}

macro_rules! lock_or_500 {
	($data:expr) => {
		match $data.lock() {
			Ok(guard) => guard,
			Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
		}
	};
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates text biased toward `seed` (comma separated words).
/// `size` is the sentence count (`0` for no limit).
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let request = query.request();
	let shared_data = lock_or_500!(data);

	match shared_data.model.generate(&request) {
		Ok(text) => HttpResponse::Ok().body(text),
		Err(e) => error_response(e),
	}
}

/// HTTP POST endpoint `/v1/update`
///
/// Body: a JSON string (text) or an array of strings (tokens).
#[post("/v1/update")]
async fn post_update(data: web::Data<Mutex<SharedData>>, body: web::Json<serde_json::Value>) -> impl Responder {
	let input = match CorpusInput::try_from(body.into_inner()) {
		Ok(input) => input,
		Err(e) => return error_response(e),
	};
	let mut shared_data = lock_or_500!(data);

	match shared_data.model.update(input) {
		Ok(added) => HttpResponse::Ok().body(format!("{added} tokens added")),
		Err(e) => error_response(e),
	}
}

#[put("/v1/dump")]
async fn put_dump(data: web::Data<Mutex<SharedData>>, query: web::Query<DumpQuery>) -> impl Responder {
	let shared_data = lock_or_500!(data);
	match shared_data.model.dump(query.name.as_deref()) {
		Ok(path) => HttpResponse::Ok().body(path.display().to_string()),
		Err(e) => error_response(e),
	}
}

#[put("/v1/load")]
async fn put_load(data: web::Data<Mutex<SharedData>>, query: web::Query<DumpQuery>) -> impl Responder {
	let mut shared_data = lock_or_500!(data);
	match shared_data.model.load_dump(query.name.as_deref()) {
		Ok(()) => HttpResponse::Ok().body("Dump loaded successfully"),
		Err(e) => error_response(e),
	}
}

#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let folder = lock_or_500!(data).data_folder.clone();
	match list_files(&folder, "txt") {
		Ok(files) => {
			let names: Vec<String> = files.iter().filter_map(|file| get_filename(file).ok()).collect();
			HttpResponse::Ok().body(names.join("\n"))
		}
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

/// HTTP PUT endpoint `/v1/vocabulary`
///
/// Replaces the model sequence with the tokens of `<data>/<source>.txt`.
/// Tokens are cached per (source, filter); `refresh=true` re-reads the file.
#[put("/v1/vocabulary")]
async fn put_vocabulary(data: web::Data<Mutex<SharedData>>, query: web::Query<VocabularyQuery>) -> impl Responder {
	let source = match &query.source {
		Some(s) if !s.trim().is_empty() => s.trim().to_owned(),
		_ => return HttpResponse::BadRequest().body("Missing or empty source name"),
	};
	if !is_plain_name(&source) {
		return error_response(MarkovError::Config(format!("invalid source name {source:?}")));
	}
	let refresh = query.refresh.unwrap_or(false);

	let mut shared_data = lock_or_500!(data);
	let SharedData { model, vocabularies, data_folder } = &mut *shared_data;

	let path = data_folder.join(format!("{source}.txt"));
	let key = VocabularyKey::new(source, model.filter_id());
	let tokens = match vocabularies.get_or_load(key, refresh, || tokenize_file(&path)) {
		Ok(tokens) => tokens.to_vec(),
		Err(e) => return error_response(e),
	};

	match model.load_tokens(tokens) {
		Ok(()) => HttpResponse::Ok().body(format!("{} contexts", model.index().len())),
		Err(e) => error_response(e),
	}
}

#[get("/v1/stats")]
async fn get_stats(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = lock_or_500!(data);
	let model = &shared_data.model;
	HttpResponse::Ok().json(Stats {
		order: model.order(),
		tokens: model.tokens().len(),
		contexts: model.index().len(),
		starts: model.index().start_contexts().len(),
	})
}

/// Main entry point for the server.
///
/// Builds an empty model from the configuration, restores the default dump
/// if one exists, wraps everything in a `Mutex` and starts Actix-web.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = ServerConfig::load().map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
	let mut model = MarkovModel::with_config(config.model)
		.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

	match model.load_dump(None) {
		Ok(()) => info!("restored default dump"),
		Err(MarkovError::NotFound(path)) => info!("no dump at {}, starting empty", path.display()),
		Err(e) => warn!("failed to restore default dump: {e}"),
	}

	let shared_data = SharedData {
		model,
		vocabularies: VocabularyCache::new(),
		data_folder: normalize_folder(&config.data_folder),
	};
	let shared_model = web::Data::new(Mutex::new(shared_data));

	info!("listening on {}:{}", config.host, config.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.service(get_generated)
			.service(post_update)
			.service(put_dump)
			.service(put_load)
			.service(get_corpora)
			.service(put_vocabulary)
			.service(get_stats)
	})
		.bind((config.host.as_str(), config.port))?
		.run()
		.await
}
