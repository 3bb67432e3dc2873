//! Layered configuration for pageaudit.
//!
//! Settings are read from `.pageaudit/pageaudit.toml`, then overridden by
//! environment variables, then by CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [completion]
//! endpoint = "https://api.openai.com/v1/chat/completions"
//! model = "gpt-4o-mini"
//! api_key_env = "PAGEAUDIT_API_KEY"
//! timeout_secs = 60
//! max_tokens = 2048
//!
//! [coordinator]
//! worker_timeout_secs = 120   # 0 disables the per-worker timeout
//! question_timeout_secs = 5
//! summary_top_k = 5
//!
//! [[workers]]
//! kind = "accessibility"
//!
//! [[workers]]
//! kind = "seo"
//! focus_areas = ["Canonical tags", "hreflang"]
//!
//! [[workers]]
//! kind = { custom = "Legal Review" }
//! focus_areas = ["Cookie consent banner", "Privacy policy link"]
//! peers = ["content"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::completion::HttpCompletionConfig;
use crate::completion::http::{DEFAULT_API_KEY_ENV, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::coordinator::CoordinatorConfig;
use crate::worker::SpecialistKind;

pub const CONFIG_DIR: &str = ".pageaudit";
pub const CONFIG_FILE: &str = "pageaudit.toml";

/// Environment variable overriding `completion.endpoint`.
pub const ENV_ENDPOINT: &str = "PAGEAUDIT_ENDPOINT";
/// Environment variable overriding `completion.model`.
pub const ENV_MODEL: &str = "PAGEAUDIT_MODEL";

/// `[completion]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSection {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_completion_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    2048
}

impl Default for CompletionSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_completion_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl CompletionSection {
    pub fn to_http_config(&self) -> HttpCompletionConfig {
        HttpCompletionConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key_env: self.api_key_env.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_tokens: self.max_tokens,
        }
    }
}

/// `[coordinator]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorSection {
    /// Per-worker timeout; 0 disables it.
    #[serde(default = "default_worker_timeout_secs")]
    pub worker_timeout_secs: u64,
    #[serde(default = "default_question_timeout_secs")]
    pub question_timeout_secs: u64,
    #[serde(default = "default_summary_top_k")]
    pub summary_top_k: usize,
}

fn default_worker_timeout_secs() -> u64 {
    120
}

fn default_question_timeout_secs() -> u64 {
    5
}

fn default_summary_top_k() -> usize {
    5
}

impl Default for CoordinatorSection {
    fn default() -> Self {
        Self {
            worker_timeout_secs: default_worker_timeout_secs(),
            question_timeout_secs: default_question_timeout_secs(),
            summary_top_k: default_summary_top_k(),
        }
    }
}

impl CoordinatorSection {
    pub fn to_coordinator_config(&self) -> CoordinatorConfig {
        let worker_timeout =
            (self.worker_timeout_secs > 0).then(|| Duration::from_secs(self.worker_timeout_secs));
        CoordinatorConfig::default()
            .with_worker_timeout(worker_timeout)
            .with_question_timeout(Duration::from_secs(self.question_timeout_secs))
            .with_summary_top_k(self.summary_top_k)
    }
}

/// One `[[workers]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerEntry {
    pub kind: SpecialistKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Replaces the kind's default focus areas when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub focus_areas: Vec<String>,
    /// Worker ids whose findings this worker asks for before prompting.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub peers: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl WorkerEntry {
    pub fn new(kind: SpecialistKind) -> Self {
        Self {
            kind,
            enabled: true,
            focus_areas: Vec::new(),
            peers: Vec::new(),
        }
    }
}

fn default_workers() -> Vec<WorkerEntry> {
    SpecialistKind::all_builtins()
        .into_iter()
        .map(WorkerEntry::new)
        .collect()
}

/// The complete pageaudit.toml structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAuditToml {
    #[serde(default)]
    pub completion: CompletionSection,
    #[serde(default)]
    pub coordinator: CoordinatorSection,
    /// Workers in registration order. All built-in kinds when omitted.
    #[serde(default = "default_workers")]
    pub workers: Vec<WorkerEntry>,
}

impl Default for PageAuditToml {
    fn default() -> Self {
        Self {
            completion: CompletionSection::default(),
            coordinator: CoordinatorSection::default(),
            workers: default_workers(),
        }
    }
}

impl PageAuditToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse pageaudit.toml")
    }

    /// Load `pageaudit.toml` from `config_dir`, or defaults if it is absent.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize pageaudit.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            self.completion.endpoint = endpoint;
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            self.completion.model = model;
        }
    }

    pub fn enabled_workers(&self) -> impl Iterator<Item = &WorkerEntry> {
        self.workers.iter().filter(|w| w.enabled)
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !(self.completion.endpoint.starts_with("http://")
            || self.completion.endpoint.starts_with("https://"))
        {
            warnings.push(format!(
                "Invalid completion endpoint '{}': expected an http(s) URL",
                self.completion.endpoint
            ));
        }
        if self.completion.model.trim().is_empty() {
            warnings.push("completion.model is empty".to_string());
        }
        if self.completion.max_tokens == 0 {
            warnings.push("completion.max_tokens must be greater than 0".to_string());
        }
        if self.coordinator.question_timeout_secs == 0 {
            warnings.push(
                "coordinator.question_timeout_secs is 0: every question will time out".to_string(),
            );
        }
        if self.coordinator.summary_top_k == 0 {
            warnings.push("coordinator.summary_top_k is 0: summary prompt will list no issues".to_string());
        }

        let mut seen = HashSet::new();
        for entry in self.enabled_workers() {
            let id = entry.kind.worker_id();
            if !seen.insert(id.clone()) {
                warnings.push(format!("Worker '{}' is listed more than once", id));
            }
            if !entry.kind.is_builtin() && entry.focus_areas.is_empty() {
                warnings.push(format!(
                    "Custom worker '{}' has no focus_areas; its prompt will be generic",
                    entry.kind
                ));
            }
        }
        if seen.is_empty() {
            warnings.push("No workers are enabled".to_string());
        }

        warnings
    }
}

/// Resolved configuration for a project directory.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub project_dir: PathBuf,
    pub config_dir: PathBuf,
    pub toml: PageAuditToml,
}

impl AuditConfig {
    /// Load the file under `project_dir` and apply environment overrides.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let config_dir = project_dir.join(CONFIG_DIR);
        let mut toml = PageAuditToml::load_or_default(&config_dir)?;
        toml.apply_env(|name| std::env::var(name).ok());

        Ok(Self {
            project_dir,
            config_dir,
            toml,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn completion(&self) -> HttpCompletionConfig {
        self.toml.completion.to_http_config()
    }

    pub fn coordinator(&self) -> CoordinatorConfig {
        self.toml.coordinator.to_coordinator_config()
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
