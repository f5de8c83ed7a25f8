//! Audit configuration from `ca-audit.toml`.
//!
//! Every field is optional; command-line flags override file values.
//!
//! ```toml
//! requirements = "baselines/policy_requirements.yaml"
//! policies = "exports/policies.json"
//! format = "json"
//! max_policies = 5000
//! fail_on_missing = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "ca-audit.toml";

/// How the report is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Summary plus one line per requirement.
    #[default]
    Terminal,
    /// The full report as pretty-printed JSON.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" | "text" => Ok(OutputFormat::Terminal),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Invalid output format: '{}'. Valid formats: terminal, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Terminal => write!(f, "terminal"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Baseline YAML file.
    #[serde(default = "default_requirements")]
    pub requirements: PathBuf,

    /// Policy export JSON file. Must come from here or `--policies`.
    #[serde(default)]
    pub policies: Option<PathBuf>,

    #[serde(default)]
    pub format: OutputFormat,

    /// Refuse exports holding more policies than this.
    #[serde(default = "default_max_policies")]
    pub max_policies: usize,

    /// Exit non-zero when any requirement is MISSING.
    #[serde(default)]
    pub fail_on_missing: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            requirements: default_requirements(),
            policies: None,
            format: OutputFormat::default(),
            max_policies: default_max_policies(),
            fail_on_missing: false,
        }
    }
}

fn default_requirements() -> PathBuf {
    PathBuf::from("policy_requirements.yaml")
}

fn default_max_policies() -> usize {
    5000
}

impl AuditConfig {
    /// Load a config file. Relative paths inside it resolve against the
    /// file's own directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.requirements = base.join(&config.requirements);
            config.policies = config.policies.map(|p| base.join(p));
        }
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
