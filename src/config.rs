// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::domain::PromptSource;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Anthropic,
    OpenAI,
    Ollama,
}

impl Provider {
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Anthropic => "claude-3-5-sonnet-latest",
            Self::OpenAI => "gpt-4o",
            Self::Ollama => "qwen2.5-coder:7b",
        }
    }

    /// Provider-specific credential variable consulted after `DEEPWALKER_API_KEY`.
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Ollama => None,
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            other => Err(Error::Config(format!(
                "unknown provider '{other}' (expected anthropic, openai or ollama)"
            ))),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::OpenAI => write!(f, "openai"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: Provider,

    /// Model identifier; falls back to the provider default when unset
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Accepted file extensions, without the leading dot (case-sensitive)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Glob patterns relative to the root directory
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Files above this size are skipped instead of sent (default 256 KiB)
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    #[serde(default)]
    pub skip_secrets: bool,

    /// System prompt: existing file path or literal text
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// System prompt file; must exist
    #[serde(default)]
    pub system_prompt_file: Option<PathBuf>,

    /// System prompt text, used verbatim
    #[serde(default)]
    pub system_prompt_text: Option<String>,

    /// Report destination, "-" for stdout
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Request timeout in seconds (default 300)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// LLM temperature (0.0-2.0, default 0.2)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate per file (default 8192)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Base URL for OpenAI-compatible APIs (default: https://api.openai.com/v1)
    #[serde(default)]
    pub openai_base_url: Option<String>,

    /// Base URL for the Anthropic API (default: https://api.anthropic.com/v1)
    #[serde(default)]
    pub anthropic_base_url: Option<String>,

    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,
}

fn default_true() -> bool {
    true
}
fn default_extensions() -> Vec<String> {
    vec!["js".into(), "mjs".into()]
}
fn default_max_file_bytes() -> u64 {
    256 * 1024
}
fn default_output() -> PathBuf {
    PathBuf::from("security_analysis_report.txt")
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    8192
}
fn default_ollama_host() -> String {
    "http://localhost:11434".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            api_key: None,
            extensions: default_extensions(),
            recursive: true,
            exclude: Vec::new(),
            max_file_bytes: default_max_file_bytes(),
            skip_secrets: false,
            system_prompt: None,
            system_prompt_file: None,
            system_prompt_text: None,
            output: default_output(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            openai_base_url: None,
            anthropic_base_url: None,
            ollama_host: default_ollama_host(),
        }
    }
}

impl Config {
    /// Load with priority: CLI > ENV > user config > project config > defaults
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Project-level config (.deepwalker.toml in the working directory)
        if let Ok(cwd) = std::env::current_dir() {
            let project_config = cwd.join(".deepwalker.toml");
            if project_config.exists() {
                figment = figment.merge(Toml::file(&project_config));
            }
        }

        if let Some(path) = Self::config_path()
            && path.exists()
        {
            figment = figment.merge(Toml::file(&path));
        }

        // DEEPWALKER_MODEL, DEEPWALKER_API_KEY, ...
        figment = figment.merge(Env::prefixed("DEEPWALKER_").split("__"));

        let mut config: Config = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.apply_cli(cli)?;

        if config.api_key.is_none() {
            config.api_key = config
                .provider
                .api_key_env()
                .and_then(|var| std::env::var(var).ok());
        }

        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "deepwalker").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Effective model identifier
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// The tagged prompt choice: file, then text, then the overloaded value.
    pub fn prompt_source(&self) -> PromptSource {
        if let Some(ref path) = self.system_prompt_file {
            return PromptSource::File(path.clone());
        }
        if let Some(ref text) = self.system_prompt_text {
            return PromptSource::Literal(text.clone());
        }
        match self.system_prompt {
            Some(ref value) => PromptSource::Auto(value.clone()),
            None => PromptSource::Default,
        }
    }

    fn apply_cli(&mut self, cli: &Cli) -> Result<()> {
        if let Some(ref p) = cli.provider {
            self.provider = p.parse()?;
        }
        if let Some(ref m) = cli.model {
            self.model = Some(m.clone());
        }
        if !cli.extensions.is_empty() {
            self.extensions = cli.extensions.clone();
        }
        if cli.no_recursive {
            self.recursive = false;
        }
        if !cli.exclude.is_empty() {
            self.exclude.extend(cli.exclude.iter().cloned());
        }
        if let Some(bytes) = cli.max_file_bytes {
            self.max_file_bytes = bytes;
        }
        if cli.skip_secrets {
            self.skip_secrets = true;
        }
        // A prompt given on the command line replaces whichever kind the files set
        if cli.system_prompt.is_some()
            || cli.system_prompt_file.is_some()
            || cli.system_prompt_text.is_some()
        {
            self.system_prompt = cli.system_prompt.clone();
            self.system_prompt_file = cli.system_prompt_file.clone();
            self.system_prompt_text = cli.system_prompt_text.clone();
        }
        if let Some(ref output) = cli.output {
            self.output = output.clone();
        }
        Ok(())
    }

    /// Strip leading dots and blanks from extensions ("--ext .js" means "js")
    fn normalize(&mut self) {
        self.extensions = self
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect();
        self.extensions.dedup();
    }

    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(Error::Config(
                "at least one file extension is required".into(),
            ));
        }

        if self.max_file_bytes == 0 {
            return Err(Error::Config("max_file_bytes must be at least 1".into()));
        }

        if !(1..=3600).contains(&self.timeout_secs) {
            return Err(Error::Config(format!(
                "timeout_secs must be 1–3600, got {}",
                self.timeout_secs
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "temperature must be 0.0–2.0, got {}",
                self.temperature
            )));
        }

        if !(1..=200_000).contains(&self.max_tokens) {
            return Err(Error::Config(format!(
                "max_tokens must be 1–200000, got {}",
                self.max_tokens
            )));
        }

        if self.model().trim().is_empty() {
            return Err(Error::Config("model cannot be empty".into()));
        }

        check_base_url("ollama_host", &self.ollama_host)?;
        if let Some(ref base) = self.openai_base_url {
            check_base_url("openai_base_url", base)?;
        }
        if let Some(ref base) = self.anthropic_base_url {
            check_base_url("anthropic_base_url", base)?;
        }

        Ok(())
    }

    /// Create default config file with secure permissions
    pub fn create_default() -> Result<PathBuf> {
        let Some(dir) = Self::config_dir() else {
            return Err(Error::Config("Cannot determine config directory".into()));
        };

        fs::create_dir_all(&dir)?;

        let path = dir.join("config.toml");
        let content = r#"# Deepwalker Configuration

# LLM provider: anthropic, openai, ollama
provider = "anthropic"

# Model name (defaults to the provider's recommended model)
# model = "claude-3-5-sonnet-latest"

# File extensions to analyze (without the dot, case-sensitive)
extensions = ["js", "mjs"]

# Walk subdirectories
recursive = true

# Glob patterns (relative to the analyzed directory) to leave out
# exclude = ["node_modules/**", "**/*.min.js"]

# Files larger than this are reported as skipped
max_file_bytes = 262144

# Never send files that look like they contain credentials
skip_secrets = false

# System prompt: path to an existing file, or the literal instruction text
# system_prompt = "system_prompt.txt"

# Report destination ("-" for stdout)
output = "security_analysis_report.txt"

# Per-request timeout in seconds
timeout_secs = 300

# Maximum tokens generated per file
max_tokens = 8192
"#;

        fs::write(&path, content)?;

        // Set secure permissions (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(path)
    }
}

fn check_base_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| Error::Config(format!("{field} is not a valid URL ('{value}'): {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "{field} must start with http:// or https://, got '{value}'"
        )));
    }

    Ok(())
}
