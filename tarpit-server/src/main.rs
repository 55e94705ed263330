mod api;
mod config;
mod ledger;
mod templates;

use std::io;
use std::sync::RwLock;
use std::time::Instant;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};

use tarpit_core::generators::corpus::WordCorpus;
use tarpit_core::model::ModelStore;

use crate::api::AppState;
use crate::config::{CONFIG_ENV, ServerConfig, config_path};
use crate::ledger::ClientLedger;
use crate::templates::TemplateStore;

/// Main entry point for the tarpit server.
///
/// Reads the configuration (first argument, `TARPIT_CONFIG`, or
/// `tarpit.toml`), compiles the template directory, loads the persisted
/// model if any, then serves every unmatched GET as a generated page.
#[actix_web::main]
async fn main() -> io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let path = config_path(std::env::args().nth(1), std::env::var(CONFIG_ENV).ok());
	let config = ServerConfig::load(&path).map_err(io::Error::other)?;

	let corpus = match &config.paths.words_file {
		Some(words) => WordCorpus::load(words).map_err(io::Error::other)?,
		None => WordCorpus::embedded(),
	};
	let templates = TemplateStore::load(&config.paths.templates_dir).map_err(io::Error::other)?;
	if templates.is_empty() {
		log::warn!("No templates in {}, pages will fail until one is uploaded", config.paths.templates_dir.display());
	}

	let state = web::Data::new(AppState {
		started: Instant::now(),
		runtime: RwLock::new(config.runtime()),
		ledger: ClientLedger::new(),
		templates,
		model: ModelStore::load_or_empty(&config.paths.model_path),
		corpus,
		model_path: config.paths.model_path.clone(),
		training: config.markov.training_options(),
	});

	let bind = (config.server.host.clone(), config.server.port);
	log::info!("Listening on {}:{}", bind.0, bind.1);

	HttpServer::new(move || {
		let cors = Cors::default().allow_any_origin().allow_any_method().allow_any_header();
		App::new()
			.app_data(state.clone())
			.wrap(cors)
			.wrap(middleware::Logger::default())
			.configure(api::configure)
	})
		.bind(bind)?
		.run()
		.await
}
