use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("Download failed: {0}")]
	DownloadFailed(String),

	#[error("Failed to download {repo_id} after {attempts} attempts: {last_error}")]
	RetriesExhausted {
		repo_id: String,
		attempts: u32,
		last_error: String,
	},

	#[error("Not found in local cache: {0}")]
	NotCached(String),

	#[error("Failed to load {0}")]
	ModelLoadFailed(String),

	#[error("Cache directory does not exist: {}", .0.display())]
	CacheMissing(PathBuf),

	#[error("Cache too small ({size_gib:.1} GB, expected at least {min_gib:.1} GB), models not fully cached")]
	CacheTooSmall { size_gib: f64, min_gib: f64 },

	#[error("Configuration error: {0}")]
	ConfigError(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	SerializationError(String),
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::SerializationError(err.to_string())
	}
}

impl From<toml::de::Error> for Error {
	fn from(err: toml::de::Error) -> Self {
		Error::SerializationError(err.to_string())
	}
}

impl From<toml::ser::Error> for Error {
	fn from(err: toml::ser::Error) -> Self {
		Error::SerializationError(err.to_string())
	}
}

impl From<hf_hub::api::sync::ApiError> for Error {
	fn from(err: hf_hub::api::sync::ApiError) -> Self {
		Error::DownloadFailed(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, Error>;
