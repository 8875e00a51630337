use serde::{Deserialize, Serialize};
use std::fmt;

pub const HIDREAM_REPO_ID: &str = "HiDream-ai/HiDream-I1-Full";
pub const LLAMA_REPO_ID: &str = "unsloth/Meta-Llama-3.1-8B-Instruct";

/// A hub repository that must end up in the local cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub repo_id: String,
    /// Case-insensitive token expected in the cache directory name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default = "fallback_required_files")]
    pub required_files: Vec<String>,
}

impl ModelSpec {
    pub fn new(repo_id: &str, brand: &str, required_files: &[&str]) -> Self {
        Self {
            repo_id: repo_id.to_string(),
            brand: Some(brand.to_string()),
            required_files: required_files.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn brand(&self) -> String {
        match &self.brand {
            Some(brand) => brand.to_lowercase(),
            None => brand_from_repo(&self.repo_id),
        }
    }
}

/// Leading alphabetic run of the repository name, lowercased:
/// `"HiDream-ai/HiDream-I1-Full"` gives `"hidream"`.
pub fn brand_from_repo(repo_id: &str) -> String {
    let name = repo_id.rsplit('/').next().unwrap_or(repo_id);
    let token: String = name
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_lowercase();

    if token.is_empty() {
        name.to_lowercase()
    } else {
        token
    }
}

fn fallback_required_files() -> Vec<String> {
    ["config.json", "model.safetensors", "tokenizer.json"]
        .iter()
        .map(|f| f.to_string())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Tokenizer,
    Config,
    Weights,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Tokenizer => write!(f, "tokenizer"),
            ComponentKind::Config => write!(f, "config"),
            ComponentKind::Weights => write!(f, "weights"),
        }
    }
}

/// A single file that has to load from the cache with networking off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub kind: ComponentKind,
    pub repo_id: String,
    pub file: String,
    pub label: String,
}

impl Component {
    pub fn new(kind: ComponentKind, repo_id: &str, file: &str, label: &str) -> Self {
        Self {
            kind,
            repo_id: repo_id.to_string(),
            file: file.to_string(),
            label: label.to_string(),
        }
    }
}

/// Download order matters: the diffusion model goes first.
pub fn default_models() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new(
            HIDREAM_REPO_ID,
            "hidream",
            &[
                "config.json",
                "model.safetensors.index.json",
                "diffusion_pytorch_model.safetensors",
                "tokenizer.json",
                "tokenizer_config.json",
                "special_tokens_map.json",
            ],
        ),
        ModelSpec::new(
            LLAMA_REPO_ID,
            "llama",
            &[
                "config.json",
                "tokenizer.json",
                "tokenizer_config.json",
                "special_tokens_map.json",
                "model.safetensors.index.json",
                "generation_config.json",
            ],
        ),
    ]
}

pub fn default_components() -> Vec<Component> {
    vec![
        Component::new(ComponentKind::Tokenizer, LLAMA_REPO_ID, "tokenizer.json", "Llama tokenizer"),
        Component::new(ComponentKind::Config, LLAMA_REPO_ID, "config.json", "Llama config"),
        Component::new(ComponentKind::Config, HIDREAM_REPO_ID, "config.json", "HiDream config"),
        Component::new(ComponentKind::Config, HIDREAM_REPO_ID, "vae/config.json", "HiDream VAE config"),
        Component::new(
            ComponentKind::Weights,
            HIDREAM_REPO_ID,
            "vae/diffusion_pytorch_model.safetensors",
            "HiDream VAE weights",
        ),
    ]
}

/// What the diagnostic checker loads: the text tokenizer and the diffusion config.
pub fn default_check_components() -> Vec<Component> {
    vec![
        Component::new(ComponentKind::Tokenizer, LLAMA_REPO_ID, "tokenizer.json", "Llama tokenizer"),
        Component::new(ComponentKind::Config, HIDREAM_REPO_ID, "config.json", "HiDream config"),
    ]
}
