use crate::cache::HubCache;
use crate::error::{Error, Result};
use crate::model::{Component, ComponentKind};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// What a successful offline load found.
#[derive(Debug, Clone)]
pub struct LoadedComponent {
    pub path: PathBuf,
    pub summary: String,
}

pub trait ComponentLoader {
    fn load(&self, component: &Component) -> Result<LoadedComponent>;
}

/// Loads components strictly from the local cache. A file the cache lookup
/// cannot resolve is an error; nothing is ever downloaded.
pub struct OfflineLoader {
    cache: HubCache,
}

impl OfflineLoader {
    pub fn new(cache: HubCache) -> Self {
        Self { cache }
    }
}

impl ComponentLoader for OfflineLoader {
    fn load(&self, component: &Component) -> Result<LoadedComponent> {
        let path = self
            .cache
            .lookup(&component.repo_id, &component.file)
            .ok_or_else(|| Error::NotCached(format!("{}/{}", component.repo_id, component.file)))?;

        tracing::debug!("Loading {} from {:?}", component.label, path);

        let summary = match component.kind {
            ComponentKind::Tokenizer => load_tokenizer(&path)?,
            ComponentKind::Config => load_config(&path)?,
            ComponentKind::Weights => load_weights(&path)?,
        };

        Ok(LoadedComponent { path, summary })
    }
}

fn load_tokenizer(path: &Path) -> Result<String> {
    let tokenizer = tokenizers::Tokenizer::from_file(path)
        .map_err(|e| Error::ModelLoadFailed(format!("tokenizer: {}", e)))?;

    Ok(format!("{} tokens", tokenizer.get_vocab_size(true)))
}

fn load_config(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::ModelLoadFailed(format!("Failed to read config: {}", e)))?;

    let config: Value = serde_json::from_str(&content)
        .map_err(|e| Error::ModelLoadFailed(format!("Failed to parse config: {}", e)))?;

    let fields = config.as_object().ok_or_else(|| {
        Error::ModelLoadFailed(format!("{} is not a JSON object", path.display()))
    })?;

    // transformers configs carry `model_type`, diffusers configs `_class_name`
    let kind = fields
        .get("model_type")
        .or_else(|| fields.get("_class_name"))
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");

    Ok(format!("{} ({} keys)", kind, fields.len()))
}

fn load_weights(path: &Path) -> Result<String> {
    let safetensors = unsafe {
        candle_core::safetensors::MmapedSafetensors::new(path)
            .map_err(|e| Error::ModelLoadFailed(format!("Failed to load safetensors: {}", e)))?
    };

    let count = safetensors.tensors().len();
    if count == 0 {
        return Err(Error::ModelLoadFailed(format!(
            "{} holds no tensors",
            path.display()
        )));
    }

    Ok(format!("{} tensors", count))
}
