//! User configuration stored at `~/.config/commitai/config.toml`.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::io::process::CommandLimits;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "COMMITAI_CONFIG";

/// Reasoning service backing `generate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Anthropic,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::OpenAi, Provider::Anthropic];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Anthropic => "claude-3-haiku-20240307",
        }
    }

    /// Models offered by `setup`; a custom name can always be entered instead.
    pub fn known_models(self) -> &'static [&'static str] {
        match self {
            Provider::OpenAi => &["gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"],
            Provider::Anthropic => &[
                "claude-3-5-sonnet-latest",
                "claude-3-5-haiku-latest",
                "claude-3-opus-latest",
                "claude-3-sonnet-20240229",
                "claude-3-haiku-20240307",
            ],
        }
    }

    fn key_env(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            other => Err(anyhow!(
                "unknown provider: {other}. Supported providers: openai, anthropic"
            )),
        }
    }
}

/// commitai configuration (TOML).
///
/// Missing fields default to sensible values so a partial file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommitaiConfig {
    /// Git executable used for diff collection and commits.
    pub git: String,

    pub provider: Provider,

    /// Model name; empty means the provider default.
    pub model: String,

    /// Key used for whichever provider is selected.
    pub api_key: String,

    pub openai_api_key: String,

    pub anthropic_api_key: String,

    /// Reasoning-service request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Timeout for each git command run while collecting the diff.
    pub diff_timeout_secs: u64,

    /// Diff text beyond this many bytes is dropped before prompting.
    pub diff_output_limit_bytes: usize,
}

impl Default for CommitaiConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            provider: Provider::default(),
            model: String::new(),
            api_key: String::new(),
            openai_api_key: String::new(),
            anthropic_api_key: String::new(),
            request_timeout_secs: 120,
            diff_timeout_secs: 60,
            diff_output_limit_bytes: 200_000,
        }
    }
}

/// Command-line overrides layered on top of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub git: Option<String>,
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

impl CommitaiConfig {
    pub fn validate(&self) -> Result<()> {
        if self.git.trim().is_empty() {
            return Err(anyhow!("git must be a non-empty path"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be > 0"));
        }
        if self.diff_timeout_secs == 0 {
            return Err(anyhow!("diff_timeout_secs must be > 0"));
        }
        if self.diff_output_limit_bytes == 0 {
            return Err(anyhow!("diff_output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(git) = overrides.git {
            self.git = git;
        }
        if let Some(provider) = overrides.provider {
            self.provider = provider;
        }
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(key) = overrides.api_key {
            self.api_key = key;
        }
        if let Some(key) = overrides.openai_api_key {
            self.openai_api_key = key;
        }
        if let Some(key) = overrides.anthropic_api_key {
            self.anthropic_api_key = key;
        }
    }

    /// Model to request, falling back to the provider default.
    pub fn effective_model(&self) -> &str {
        if self.model.trim().is_empty() {
            self.provider.default_model()
        } else {
            self.model.trim()
        }
    }

    /// `api_key`, then the provider-specific key, then the provider's
    /// environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        let provider_key = match self.provider {
            Provider::OpenAi => &self.openai_api_key,
            Provider::Anthropic => &self.anthropic_api_key,
        };
        [&self.api_key, provider_key]
            .into_iter()
            .map(|key| key.trim())
            .find(|key| !key.is_empty())
            .map(str::to_string)
            .or_else(|| {
                env::var(self.provider.key_env())
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn diff_limits(&self) -> CommandLimits {
        CommandLimits {
            timeout: Duration::from_secs(self.diff_timeout_secs),
            output_limit_bytes: self.diff_output_limit_bytes,
        }
    }

    /// Copy with every key replaced by a short mask, for display.
    pub fn redacted(&self) -> Self {
        Self {
            api_key: mask(&self.api_key),
            openai_api_key: mask(&self.openai_api_key),
            anthropic_api_key: mask(&self.anthropic_api_key),
            ..self.clone()
        }
    }
}

fn mask(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return String::new();
    }
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{tail}")
}

/// Resolve the config path: explicit path, then `COMMITAI_CONFIG`, then
/// `<config dir>/commitai/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .ok_or_else(|| anyhow!("cannot determine config directory; set {CONFIG_ENV}"))?;
    Ok(base.join("commitai").join("config.toml"))
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CommitaiConfig::default()`.
pub fn load_config(path: &Path) -> Result<CommitaiConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = CommitaiConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CommitaiConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    debug!(path = %path.display(), provider = %cfg.provider, "config loaded");
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &CommitaiConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
