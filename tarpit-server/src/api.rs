use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Instant;

use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, Responder, ResponseError, get, post, web};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tarpit_core::TarpitError;
use tarpit_core::generators::corpus::WordCorpus;
use tarpit_core::generators::primitives::capitalize;
use tarpit_core::macros::{MacroContext, RenderData, TemplateError};
use tarpit_core::model::{ModelStore, TrainingOptions};

use crate::config::{ConfigError, RuntimeConfig};
use crate::ledger::ClientLedger;
use crate::templates::{StoreError, TemplateStore};

#[derive(Error, Debug)]
pub enum ApiError {
	#[error("{0}")]
	BadRequest(String),
	#[error("{0}")]
	NotFound(String),
	#[error("No templates available")]
	NoTemplates,
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Render(#[from] TemplateError),
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Model(#[from] TarpitError),
	#[error(transparent)]
	Blocking(#[from] actix_web::error::BlockingError),
}

impl ResponseError for ApiError {
	fn status_code(&self) -> StatusCode {
		match self {
			ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ApiError::NotFound(_) => StatusCode::NOT_FOUND,
			ApiError::NoTemplates => StatusCode::SERVICE_UNAVAILABLE,
			ApiError::Store(StoreError::InvalidName(_) | StoreError::Template(_)) => StatusCode::BAD_REQUEST,
			ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
			ApiError::Config(ConfigError::Validation(_)) => StatusCode::BAD_REQUEST,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn error_response(&self) -> HttpResponse {
		if self.status_code().is_server_error() {
			log::error!("{self}");
		}
		HttpResponse::build(self.status_code()).body(self.to_string())
	}
}

/// Everything the handlers share.
pub struct AppState {
	pub started: Instant,
	pub runtime: RwLock<RuntimeConfig>,
	pub ledger: ClientLedger,
	pub templates: TemplateStore,
	pub model: ModelStore,
	pub corpus: WordCorpus,
	pub model_path: PathBuf,
	pub training: TrainingOptions,
}

impl AppState {
	fn runtime(&self) -> RuntimeConfig {
		self.runtime.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfo {
	app_version: &'static str,
	uptime: f64,
	os: String,
	arch: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryInfo {
	total_queries: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadTemplate {
	#[serde(default)]
	file_name: String,
	#[serde(default)]
	content_base64: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteTemplate {
	#[serde(default)]
	file_name: String,
}

#[derive(Deserialize)]
struct TrainMarkov {
	#[serde(default)]
	corpus: String,
}

#[derive(Serialize)]
struct Message {
	message: &'static str,
}

/// HTTP GET endpoint `/api/server/info`
#[get("/api/server/info")]
async fn server_info(data: web::Data<AppState>) -> impl Responder {
	web::Json(ServerInfo {
		app_version: env!("CARGO_PKG_VERSION"),
		uptime: data.started.elapsed().as_secs_f64(),
		os: capitalize(std::env::consts::OS),
		arch: capitalize(std::env::consts::ARCH),
	})
}

/// HTTP GET endpoint `/api/templates/info`
#[get("/api/templates/info")]
async fn templates_info(data: web::Data<AppState>) -> Result<impl Responder, ApiError> {
	Ok(web::Json(data.templates.info()?))
}

#[get("/api/logging/queries/ip")]
async fn queries_by_ip(data: web::Data<AppState>) -> impl Responder {
	let per_level = data.runtime().aggression.queries_per_aggression;
	web::Json(data.ledger.ip_entries(per_level))
}

#[get("/api/logging/queries/useragent")]
async fn queries_by_user_agent(data: web::Data<AppState>) -> impl Responder {
	let per_level = data.runtime().aggression.queries_per_aggression;
	web::Json(data.ledger.user_agent_entries(per_level))
}

#[get("/api/logging/queries/info")]
async fn queries_info(data: web::Data<AppState>) -> impl Responder {
	web::Json(QueryInfo { total_queries: data.ledger.total_queries() })
}

/// HTTP POST endpoint `/api/templates/upload`
///
/// Accepts `{"fileName": "...", "contentBase64": "..."}`. The template is
/// compiled before it is written, so a broken upload is rejected with 400.
#[post("/api/templates/upload")]
async fn upload_template(
	data: web::Data<AppState>,
	body: web::Json<UploadTemplate>,
) -> Result<impl Responder, ApiError> {
	if body.file_name.is_empty() || body.content_base64.is_empty() {
		return Err(ApiError::BadRequest("Both JSON fields must not be empty.".into()));
	}
	let bytes = STANDARD
		.decode(body.content_base64.trim())
		.map_err(|e| ApiError::BadRequest(format!("Invalid base64: {e}")))?;
	let source = String::from_utf8(bytes)
		.map_err(|_| ApiError::BadRequest("Template is not valid UTF-8".into()))?;

	data.templates.save(&body.file_name, &source)?;
	Ok(HttpResponse::Ok().body("OK"))
}

#[post("/api/templates/delete")]
async fn delete_template(
	data: web::Data<AppState>,
	body: web::Json<DeleteTemplate>,
) -> Result<impl Responder, ApiError> {
	if body.file_name.is_empty() {
		return Err(ApiError::BadRequest("JSON field \"fileName\" must not be empty.".into()));
	}
	data.templates.delete(&body.file_name)?;
	Ok(HttpResponse::Ok().body("OK"))
}

/// HTTP POST endpoint `/api/markov/train`
///
/// Extends the current model with `corpus`, swaps it in, then persists it.
#[post("/api/markov/train")]
async fn train_markov(
	data: web::Data<AppState>,
	body: web::Json<TrainMarkov>,
) -> Result<impl Responder, ApiError> {
	let corpus = body.into_inner().corpus;
	if corpus.trim().is_empty() {
		return Err(ApiError::BadRequest("Corpus must not be empty.".into()));
	}

	let state = data.clone();
	web::block(move || {
		let chain = state.model.retrain(&corpus, &state.training);
		log::info!("Model retrained: order {}, {} states", chain.order(), chain.state_count());
		chain.save(&state.model_path)
	})
	.await??;

	Ok(HttpResponse::Ok().body("OK"))
}

/// HTTP POST endpoint `/config`
///
/// Replaces the runtime configuration (delay, aggression, links).
#[post("/config")]
async fn update_config(
	data: web::Data<AppState>,
	body: web::Json<RuntimeConfig>,
) -> Result<impl Responder, ApiError> {
	let runtime = body.into_inner();
	runtime.validate()?;
	*data.runtime.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = runtime;
	log::info!("Runtime configuration updated");
	Ok(web::Json(Message { message: "Configuration updated successfully." }))
}

fn client_ip(req: &HttpRequest) -> String {
	req.peer_addr()
		.map(|addr| addr.ip().to_string())
		.unwrap_or_else(|| "unknown".to_owned())
}

fn user_agent(req: &HttpRequest) -> String {
	req.headers()
		.get(header::USER_AGENT)
		.and_then(|value| value.to_str().ok())
		.unwrap_or_default()
		.to_owned()
}

/// Every other GET: a freshly rendered tarpit page.
///
/// The client is counted first, then the response is held back for the
/// configured delay before a random template is rendered at the client's
/// aggression level.
#[get("/{tail:.*}")]
async fn serve_page(data: web::Data<AppState>, req: HttpRequest) -> Result<impl Responder, ApiError> {
	let path = req.path();
	if path.starts_with("/api") || path.starts_with("/config") {
		return Err(ApiError::NotFound(format!("No route for {path}")));
	}

	let runtime = data.runtime();
	let ip = client_ip(&req);
	let agent = user_agent(&req);
	let aggression = data.ledger.record(&ip, &agent, runtime.aggression.queries_per_aggression);

	let delay = runtime.delay.pick(&mut rand::rng());
	actix_web::rt::time::sleep(delay).await;

	let mut rng = StdRng::from_rng(&mut rand::rng());
	let template = data.templates.pick(&mut rng).ok_or(ApiError::NoTemplates)?;
	log::info!("Serving {} to {ip} with aggression {aggression}", template.name());

	let model = data.model.current();
	let links = runtime.links.to_settings();
	let mut ctx = MacroContext {
		rng: &mut rng,
		corpus: &data.corpus,
		model: model.as_deref(),
		links: &links,
	};
	let page = template.render(&mut ctx, &RenderData { aggression: aggression as i64 })?;

	Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(page))
}

/// Registers every route; the catch-all page handler goes last.
pub fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(server_info)
		.service(templates_info)
		.service(queries_by_ip)
		.service(queries_by_user_agent)
		.service(queries_info)
		.service(upload_template)
		.service(delete_template)
		.service(train_markov)
		.service(update_config)
		.service(serve_page);
}
