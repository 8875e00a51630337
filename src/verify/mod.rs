use crate::cache::{bytes_to_gib, repo_folder_name, HubCache};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::loader::ComponentLoader;
use crate::model::ModelSpec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How verification failures are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Fail closed: the first failed check stops verification and fails the run.
    Strict,
    /// Fail open: failures become warnings and the run still succeeds.
    Permissive,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Strict => write!(f, "strict"),
            Policy::Permissive => write!(f, "permissive"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Warning,
    Failed,
}

#[derive(Debug, Clone)]
pub struct Finding {
    pub check: String,
    pub outcome: Outcome,
    pub detail: String,
}

#[derive(Debug)]
pub struct VerifyReport {
    pub policy: Policy,
    pub findings: Vec<Finding>,
}

impl VerifyReport {
    fn new(policy: Policy) -> Self {
        Self {
            policy,
            findings: Vec::new(),
        }
    }

    /// Record a check result. Returns `false` when verification must stop.
    fn record(&mut self, check: &str, result: Result<String>) -> bool {
        let (outcome, detail) = match result {
            Ok(detail) => {
                println!("✅ {}: {}", check, detail);
                (Outcome::Passed, detail)
            }
            Err(e) => match self.policy {
                Policy::Strict => {
                    println!("❌ FATAL: {}: {}", check, e);
                    (Outcome::Failed, e.to_string())
                }
                Policy::Permissive => {
                    println!("⚠️ {}: {}", check, e);
                    tracing::warn!(check = %check, error = %e, "Verification check failed, continuing");
                    (Outcome::Warning, e.to_string())
                }
            },
        };

        self.findings.push(Finding {
            check: check.to_string(),
            outcome,
            detail,
        });
        outcome != Outcome::Failed
    }

    /// Findings that did not pass, in the order they were recorded.
    pub fn problems(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.outcome != Outcome::Passed)
    }

    pub fn passed(&self) -> bool {
        self.findings.iter().all(|f| f.outcome != Outcome::Failed)
    }

    pub fn warnings(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.outcome == Outcome::Warning)
            .count()
    }

    pub fn exit_code(&self) -> u8 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

/// Confirms the cache can serve every configured component offline.
pub struct Verifier<'a, L: ComponentLoader> {
    cache: &'a HubCache,
    loader: &'a L,
    config: &'a Config,
}

impl<'a, L: ComponentLoader> Verifier<'a, L> {
    pub fn new(cache: &'a HubCache, loader: &'a L, config: &'a Config) -> Self {
        Self {
            cache,
            loader,
            config,
        }
    }

    pub fn run(&self) -> VerifyReport {
        let mut report = VerifyReport::new(self.config.verify.policy);
        tracing::info!(
            "Verifying {} ({} policy)",
            self.cache.root().display(),
            report.policy
        );

        if !self.cache.exists() {
            let missing = Err(Error::CacheMissing(self.cache.root().to_path_buf()));
            if !report.record("cache directory", missing) {
                return report;
            }
        }

        for component in &self.config.components {
            println!("🔍 Loading {} offline...", component.label);
            let result = self.loader.load(component).map(|loaded| {
                tracing::debug!("{} resolved to {}", component.label, loaded.path.display());
                loaded.summary
            });
            if !report.record(&component.label, result) {
                return report;
            }
        }

        if !report.record("cache size", self.check_size()) {
            return report;
        }

        for model in &self.config.models {
            let check = format!("{} directory", model.repo_id);
            if !report.record(&check, self.check_brand(model)) {
                return report;
            }
        }

        report
    }

    fn check_size(&self) -> Result<String> {
        let bytes = self.cache.total_size()?;
        let size_gib = bytes_to_gib(bytes);
        println!("📊 Cache size: {:.1} GB", size_gib);

        if bytes < self.config.min_cache_bytes() {
            return Err(Error::CacheTooSmall {
                size_gib,
                min_gib: self.config.verify.min_cache_gib,
            });
        }
        Ok(format!("{:.1} GB", size_gib))
    }

    fn check_brand(&self, model: &ModelSpec) -> Result<String> {
        let brand = model.brand();
        let dirs = self.cache.dirs_matching(&brand)?;

        match dirs.first() {
            Some(dir) => Ok(format!("found {}", dir)),
            None => Err(Error::NotCached(format!(
                "no cache directory name contains '{}' (expected {})",
                brand,
                repo_folder_name(&model.repo_id)
            ))),
        }
    }
}
