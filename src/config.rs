//! Configuration management for keigo-analyzer.
//!
//! Configuration is loaded from `~/.config/keigo-analyzer/config.toml`. The
//! endpoint can be overridden by `KEIGO_ANALYSIS_ENDPOINT` and `--endpoint`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the analysis endpoint URL.
pub const ENDPOINT_ENV: &str = "KEIGO_ANALYSIS_ENDPOINT";

/// Passage the editor starts with.
pub const SAMPLE_TEXT: &str = "私は、問題解決力とコミュニケーション能力を活かせると考えています。学生時代にチームで課題に取り組む際、問題点を見つけて解決策を提案することで、チーム全体をまとめることができました。";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Analysis endpoint URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Editor preferences.
    #[serde(default)]
    pub ui: UiConfig,
}

/// Editor preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Text the editor is pre-filled with.
    #[serde(default = "default_sample_text")]
    pub sample_text: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            sample_text: default_sample_text(),
        }
    }
}

fn default_sample_text() -> String {
    SAMPLE_TEXT.to_string()
}

/// Where the effective endpoint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSource {
    Cli,
    Env,
    File,
    Missing,
}

impl fmt::Display for EndpointSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EndpointSource::Cli => "--endpoint",
            EndpointSource::Env => ENDPOINT_ENV,
            EndpointSource::File => "config file",
            EndpointSource::Missing => "not set",
        };
        f.write_str(label)
    }
}

/// Settings resolved once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: Option<String>,
    pub endpoint_source: EndpointSource,
    pub sample_text: String,
}

impl Config {
    /// Get the config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("keigo-analyzer"))
            .context("Could not determine config directory")
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the log file path used while the TUI owns the terminal.
    pub fn log_path() -> Result<PathBuf> {
        dirs::cache_dir()
            .map(|p| p.join("keigo-analyzer").join("keigo.log"))
            .context("Could not determine cache directory")
    }

    /// Load configuration from file, using defaults if not found.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific path, using defaults if not found.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        std::fs::write(&path, self.to_toml()?)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Serialize for writing, with a commented hint when no endpoint is set.
    fn to_toml(&self) -> Result<String> {
        let body = toml::to_string_pretty(self)?;
        if self.endpoint.is_some() {
            Ok(body)
        } else {
            Ok(format!(
                "# endpoint = \"https://example.com/analyze\"\n\n{}",
                body
            ))
        }
    }

    /// Resolve startup settings from the process environment.
    pub fn resolve(&self, cli_endpoint: Option<String>) -> Settings {
        self.resolve_with(cli_endpoint, std::env::var(ENDPOINT_ENV).ok())
    }

    /// Resolve startup settings. Precedence: CLI, environment, file.
    /// Blank values at any level are skipped.
    pub fn resolve_with(&self, cli_endpoint: Option<String>, env_endpoint: Option<String>) -> Settings {
        let candidates = [
            (cli_endpoint, EndpointSource::Cli),
            (env_endpoint, EndpointSource::Env),
            (self.endpoint.clone(), EndpointSource::File),
        ];

        let (endpoint, endpoint_source) = candidates
            .into_iter()
            .find_map(|(value, source)| {
                value
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (Some(v), source))
            })
            .unwrap_or((None, EndpointSource::Missing));

        Settings {
            endpoint,
            endpoint_source,
            sample_text: self.ui.sample_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.endpoint.is_none());
        assert_eq!(config.ui.sample_text, SAMPLE_TEXT);
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
endpoint = "https://api.example.com/keigo"

[ui]
sample_text = "お疲れ様です。"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("https://api.example.com/keigo"));
        assert_eq!(config.ui.sample_text, "お疲れ様です。");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.endpoint.is_none());
        assert_eq!(config.ui.sample_text, SAMPLE_TEXT);
    }

    #[test]
    fn test_serialization_hints_endpoint() {
        let toml = Config::default().to_toml().unwrap();
        assert!(toml.starts_with("# endpoint"));
        assert!(toml.contains("[ui]"));

        let parsed: Config = toml::from_str(&toml).unwrap();
        assert!(parsed.endpoint.is_none());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let path = PathBuf::from("/nonexistent/path/keigo-analyzer.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn test_endpoint_precedence() {
        let config = Config {
            endpoint: Some("https://file.example.com".to_string()),
            ..Default::default()
        };

        let settings = config.resolve_with(
            Some("https://cli.example.com".to_string()),
            Some("https://env.example.com".to_string()),
        );
        assert_eq!(settings.endpoint.as_deref(), Some("https://cli.example.com"));
        assert_eq!(settings.endpoint_source, EndpointSource::Cli);

        let settings = config.resolve_with(None, Some("https://env.example.com".to_string()));
        assert_eq!(settings.endpoint_source, EndpointSource::Env);

        let settings = config.resolve_with(None, Some("  ".to_string()));
        assert_eq!(settings.endpoint.as_deref(), Some("https://file.example.com"));
        assert_eq!(settings.endpoint_source, EndpointSource::File);
    }

    #[test]
    fn test_missing_endpoint_is_not_an_error() {
        let settings = Config::default().resolve_with(None, None);
        assert!(settings.endpoint.is_none());
        assert_eq!(settings.endpoint_source, EndpointSource::Missing);
        assert_eq!(settings.sample_text, SAMPLE_TEXT);
    }
}
