use crate::error::{Error, Result};
use crate::model::{
	default_check_components, default_components, default_models, Component, ModelSpec,
};
use crate::verify::Policy;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CACHE_DIR: &str = "/opt/huggingface_cache";
pub const CONFIG_FILE_NAME: &str = "prefetch.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	pub cache_dir: PathBuf,
	/// Hub access token. Never written back out.
	#[serde(skip_serializing)]
	pub token: Option<String>,
	pub download: DownloadSettings,
	pub verify: VerifySettings,
	pub models: Vec<ModelSpec>,
	pub components: Vec<Component>,
	/// Lighter set loaded by `check`.
	pub check_components: Vec<Component>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
	pub max_attempts: u32,
	pub retry_delay_secs: u64,
	pub progress: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifySettings {
	pub policy: Policy,
	/// Counts regular files only; snapshot symlinks into `blobs/` are not
	/// counted again, so this is not comparable with totals that follow them
	/// (those report roughly twice the real size).
	pub min_cache_gib: f64,
}

impl Default for DownloadSettings {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			retry_delay_secs: 10,
			progress: true,
		}
	}
}

impl Default for VerifySettings {
	fn default() -> Self {
		Self {
			policy: Policy::Strict,
			min_cache_gib: 25.0,
		}
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
			token: None,
			download: DownloadSettings::default(),
			verify: VerifySettings::default(),
			models: default_models(),
			components: default_components(),
			check_components: default_check_components(),
		}
	}
}

impl Config {
	/// Platform config location, e.g. `~/.config/hub-prefetch/prefetch.toml`.
	pub fn default_path() -> Option<PathBuf> {
		ProjectDirs::from("", "", "hub-prefetch").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
	}

	/// Load configuration from an explicit file, or from the platform config
	/// location when it exists, or fall back to the built-in defaults.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		match path {
			Some(path) => {
				if !path.exists() {
					return Err(Error::ConfigError(format!(
						"Config file not found: {}",
						path.display()
					)));
				}
				Self::from_file(path)
			}
			None => match Self::default_path() {
				Some(path) if path.exists() => Self::from_file(&path),
				_ => Ok(Self::default()),
			},
		}
	}

	pub fn from_file(path: &Path) -> Result<Self> {
		tracing::debug!("Reading configuration from {}", path.display());
		let content = std::fs::read_to_string(path)?;
		Self::from_toml(&content)
	}

	pub fn from_toml(content: &str) -> Result<Self> {
		let config: Config = toml::from_str(content)?;
		Ok(config)
	}

	pub fn to_toml(&self) -> Result<String> {
		Ok(toml::to_string_pretty(self)?)
	}

	pub fn validate(&self) -> Result<()> {
		if self.models.is_empty() {
			return Err(Error::ConfigError("No models configured".to_string()));
		}
		if self.download.max_attempts == 0 {
			return Err(Error::ConfigError("max_attempts must be at least 1".to_string()));
		}
		if !self.verify.min_cache_gib.is_finite() || self.verify.min_cache_gib < 0.0 {
			return Err(Error::ConfigError(format!(
				"min_cache_gib must be a non-negative number, got {}",
				self.verify.min_cache_gib
			)));
		}
		for component in self.components.iter().chain(&self.check_components) {
			if self.model(&component.repo_id).is_none() {
				return Err(Error::ConfigError(format!(
					"Component '{}' refers to unknown model {}",
					component.label, component.repo_id
				)));
			}
		}
		Ok(())
	}

	pub fn model(&self, repo_id: &str) -> Option<&ModelSpec> {
		self.models.iter().find(|m| m.repo_id == repo_id)
	}

	pub fn min_cache_bytes(&self) -> u64 {
		(self.verify.min_cache_gib * crate::cache::GIB as f64) as u64
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::ComponentKind;

	#[test]
	fn defaults_are_valid() {
		let config = Config::default();
		config.validate().unwrap();
		assert_eq!(config.cache_dir, PathBuf::from("/opt/huggingface_cache"));
		assert_eq!(config.download.max_attempts, 3);
		assert_eq!(config.download.retry_delay_secs, 10);
		assert_eq!(config.verify.policy, Policy::Strict);
		assert_eq!(config.min_cache_bytes(), 25 * 1024 * 1024 * 1024);
		let labels: Vec<_> = config.check_components.iter().map(|c| c.label.as_str()).collect();
		assert_eq!(labels, ["Llama tokenizer", "HiDream config"]);
	}

	#[test]
	fn partial_toml_keeps_defaults() {
		let config = Config::from_toml(
			r#"
			cache_dir = "/data/hf"

			[verify]
			policy = "permissive"
			"#,
		)
		.unwrap();

		assert_eq!(config.cache_dir, PathBuf::from("/data/hf"));
		assert_eq!(config.verify.policy, Policy::Permissive);
		assert_eq!(config.verify.min_cache_gib, 25.0);
		assert_eq!(config.download.max_attempts, 3);
		assert_eq!(config.models.len(), 2);
	}

	#[test]
	fn custom_models_and_components() {
		let config = Config::from_toml(
			r#"
			[[models]]
			repo_id = "org/Tiny-Model"
			required_files = ["config.json"]

			[[components]]
			kind = "config"
			repo_id = "org/Tiny-Model"
			file = "config.json"
			label = "tiny config"
			"#,
		)
		.unwrap();

		config.validate().unwrap();
		assert_eq!(config.models[0].brand(), "tiny");
		assert_eq!(config.components[0].kind, ComponentKind::Config);
	}

	#[test]
	fn rejects_component_for_unknown_model() {
		let config = Config::from_toml(
			r#"
			[[models]]
			repo_id = "org/a"

			[[components]]
			kind = "tokenizer"
			repo_id = "org/b"
			file = "tokenizer.json"
			label = "b tokenizer"
			"#,
		)
		.unwrap();

		assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
	}

	#[test]
	fn rejects_zero_attempts() {
		let mut config = Config::default();
		config.download.max_attempts = 0;
		assert!(config.validate().is_err());
	}

	#[test]
	fn token_is_not_serialized() {
		let config = Config {
			token: Some("hf_secret".to_string()),
			..Config::default()
		};
		let rendered = config.to_toml().unwrap();
		assert!(!rendered.contains("hf_secret"));
		assert!(rendered.contains("/opt/huggingface_cache"));
	}

	#[test]
	fn explicit_missing_file_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let missing = dir.path().join("nope.toml");
		assert!(matches!(Config::load(Some(&missing)), Err(Error::ConfigError(_))));
	}

	#[test]
	fn loads_explicit_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(CONFIG_FILE_NAME);
		std::fs::write(&path, "[download]\nmax_attempts = 5\n").unwrap();

		let config = Config::load(Some(&path)).unwrap();
		assert_eq!(config.download.max_attempts, 5);
		assert_eq!(config.download.retry_delay_secs, 10);
	}
}
