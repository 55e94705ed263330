//! Server configuration loaded from `tarpit.toml`.
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [paths]
//! templates_dir = "templates"
//! model_path = "markov.bin"
//! # words_file = "words.txt"   # omit to use the embedded word list
//!
//! [delay]
//! min_ms = 2000              # Delay before each tarpit page
//! max_ms = 5000
//!
//! [aggression]
//! queries_per_aggression = 10
//!
//! [links]
//! hostname = "http://localhost:8080"
//! path_whitelist = []        # Paths generated links must never start with
//! min_subpaths = 1
//! max_subpaths = 5
//!
//! [markov]
//! max_order = 5
//! min_samples_per_state = 2.0
//! ```
//!
//! The `delay`, `aggression` and `links` sections form the runtime part,
//! replaceable while the server runs through `POST /config`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tarpit_core::generators::content::LinkSettings;
use tarpit_core::model::TrainingOptions;

/// Environment variable naming the config file when no argument is given.
pub const CONFIG_ENV: &str = "TARPIT_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "tarpit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),
	#[error("Config validation error: {0}")]
	Validation(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
	pub server: ListenConfig,
	pub paths: PathsConfig,
	pub delay: DelayConfig,
	pub aggression: AggressionConfig,
	pub links: LinksConfig,
	pub markov: MarkovConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ListenConfig {
	pub host: String,
	pub port: u16,
}

impl Default for ListenConfig {
	fn default() -> Self {
		Self { host: "127.0.0.1".to_owned(), port: 8080 }
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
	pub templates_dir: PathBuf,
	pub model_path: PathBuf,
	/// Custom word list, one word per line. The embedded list is used when absent.
	pub words_file: Option<PathBuf>,
}

impl Default for PathsConfig {
	fn default() -> Self {
		Self {
			templates_dir: PathBuf::from("templates"),
			model_path: PathBuf::from("markov.bin"),
			words_file: None,
		}
	}
}

/// Random wait applied before serving each tarpit page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DelayConfig {
	pub min_ms: u64,
	pub max_ms: u64,
}

impl Default for DelayConfig {
	fn default() -> Self {
		Self { min_ms: 2000, max_ms: 5000 }
	}
}

impl DelayConfig {
	pub fn pick(&self, rng: &mut impl rand::Rng) -> Duration {
		if self.max_ms <= self.min_ms {
			return Duration::from_millis(self.min_ms);
		}
		Duration::from_millis(rng.random_range(self.min_ms..=self.max_ms))
	}
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AggressionConfig {
	/// Queries a client makes before its aggression level goes up by one.
	pub queries_per_aggression: u64,
}

impl Default for AggressionConfig {
	fn default() -> Self {
		Self { queries_per_aggression: 10 }
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LinksConfig {
	pub hostname: String,
	pub path_whitelist: Vec<String>,
	pub min_subpaths: i64,
	pub max_subpaths: i64,
}

impl Default for LinksConfig {
	fn default() -> Self {
		let settings = LinkSettings::default();
		Self {
			hostname: settings.hostname,
			path_whitelist: settings.path_whitelist,
			min_subpaths: settings.min_subpaths,
			max_subpaths: settings.max_subpaths,
		}
	}
}

impl LinksConfig {
	pub fn to_settings(&self) -> LinkSettings {
		LinkSettings {
			hostname: self.hostname.trim_end_matches('/').to_owned(),
			path_whitelist: self.path_whitelist.clone(),
			min_subpaths: self.min_subpaths,
			max_subpaths: self.max_subpaths,
		}
	}
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MarkovConfig {
	pub max_order: usize,
	pub min_samples_per_state: f64,
}

impl Default for MarkovConfig {
	fn default() -> Self {
		let options = TrainingOptions::default();
		Self {
			max_order: options.max_order,
			min_samples_per_state: options.min_samples_per_state,
		}
	}
}

impl MarkovConfig {
	pub fn training_options(&self) -> TrainingOptions {
		TrainingOptions {
			max_order: self.max_order,
			min_samples_per_state: self.min_samples_per_state,
		}
	}
}

/// The part of the configuration that can change while the server runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
	pub delay: DelayConfig,
	pub aggression: AggressionConfig,
	pub links: LinksConfig,
}

impl RuntimeConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.delay.min_ms > self.delay.max_ms {
			return Err(ConfigError::Validation(
				"delay.min_ms must not exceed delay.max_ms".into(),
			));
		}
		if self.aggression.queries_per_aggression == 0 {
			return Err(ConfigError::Validation(
				"aggression.queries_per_aggression must be non-zero".into(),
			));
		}
		if self.links.min_subpaths > self.links.max_subpaths {
			return Err(ConfigError::Validation(
				"links.min_subpaths must not exceed links.max_subpaths".into(),
			));
		}
		Ok(())
	}
}

impl ServerConfig {
	/// Validates config values are within acceptable ranges.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.server.port == 0 {
			return Err(ConfigError::Validation("server.port must be non-zero".into()));
		}
		if self.markov.min_samples_per_state <= 0.0 {
			return Err(ConfigError::Validation(
				"markov.min_samples_per_state must be positive".into(),
			));
		}
		self.runtime().validate()
	}

	pub fn runtime(&self) -> RuntimeConfig {
		RuntimeConfig {
			delay: self.delay,
			aggression: self.aggression,
			links: self.links.clone(),
		}
	}

	pub fn parse(content: &str) -> Result<Self, ConfigError> {
		let config: ServerConfig = toml::from_str(content)?;
		config.validate()?;
		Ok(config)
	}

	/// Loads `path`, or returns the defaults if the file does not exist.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		if !path.exists() {
			log::info!("No config at {}, using defaults", path.display());
			return Ok(Self::default());
		}
		let content = fs::read_to_string(path)?;
		Self::parse(&content)
	}
}

/// The config path: first CLI argument, then `TARPIT_CONFIG`, then `tarpit.toml`.
pub fn config_path(arg: Option<String>, env: Option<String>) -> PathBuf {
	arg.or(env)
		.map(PathBuf::from)
		.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_are_valid() {
		assert!(ServerConfig::default().validate().is_ok());
	}

	#[test]
	fn parse_partial_config() {
		let config = ServerConfig::parse(
			r#"
[server]
port = 9000

[links]
hostname = "https://blog.example.org/"
path_whitelist = ["/admin"]
"#,
		)
		.unwrap();
		assert_eq!(config.server.port, 9000);
		assert_eq!(config.server.host, "127.0.0.1");
		assert_eq!(config.links.to_settings().hostname, "https://blog.example.org");
		assert_eq!(config.links.max_subpaths, 5);
		assert_eq!(config.delay, DelayConfig::default());
	}

	#[test]
	fn unknown_key_rejected() {
		let err = ServerConfig::parse("[server]\nprot = 1\n").unwrap_err();
		assert!(matches!(err, ConfigError::Toml(_)));
		let err = ServerConfig::parse("[nope]\n").unwrap_err();
		assert!(matches!(err, ConfigError::Toml(_)));
	}

	#[test]
	fn invalid_values_rejected() {
		for content in [
			"[server]\nport = 0\n",
			"[delay]\nmin_ms = 10\nmax_ms = 5\n",
			"[aggression]\nqueries_per_aggression = 0\n",
			"[links]\nmin_subpaths = 4\nmax_subpaths = 2\n",
			"[markov]\nmin_samples_per_state = 0.0\n",
		] {
			let err = ServerConfig::parse(content).unwrap_err();
			assert!(matches!(err, ConfigError::Validation(_)), "{content}");
		}
	}

	#[test]
	fn missing_file_uses_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let config = ServerConfig::load(&dir.path().join("absent.toml")).unwrap();
		assert_eq!(config, ServerConfig::default());
	}

	#[test]
	fn load_reads_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("tarpit.toml");
		fs::write(&path, "[delay]\nmin_ms = 0\nmax_ms = 0\n").unwrap();
		let config = ServerConfig::load(&path).unwrap();
		assert_eq!(config.delay.max_ms, 0);
	}

	#[test]
	fn config_path_precedence() {
		assert_eq!(config_path(Some("a.toml".into()), Some("b.toml".into())), PathBuf::from("a.toml"));
		assert_eq!(config_path(None, Some("b.toml".into())), PathBuf::from("b.toml"));
		assert_eq!(config_path(None, None), PathBuf::from("tarpit.toml"));
	}

	#[test]
	fn delay_pick_stays_in_range() {
		let mut rng = rand::rng();
		let delay = DelayConfig { min_ms: 10, max_ms: 20 };
		for _ in 0..50 {
			let picked = delay.pick(&mut rng).as_millis();
			assert!((10..=20).contains(&picked));
		}
		let fixed = DelayConfig { min_ms: 7, max_ms: 7 };
		assert_eq!(fixed.pick(&mut rng), Duration::from_millis(7));
	}
}
