//! Startup configuration
//!
//! Loaded once in `main` and passed by reference into every component
//! constructor. There is no global client state - the AI client and the
//! store are built from this and threaded through explicitly.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for jot
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the item database
    pub data_dir: PathBuf,
    /// AI service settings
    pub ai: AiConfig,
}

/// AI service connection settings
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// API key; when absent every AI call fails fast and the deterministic
    /// fallbacks carry the pipeline
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Single-attempt request timeout
    pub timeout: Duration,
}

/// On-disk config file shape (`~/.config/jot/config.toml`)
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    #[serde(default)]
    ai: AiFileSection,
}

#[derive(Debug, Default, Deserialize)]
struct AiFileSection {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration: config file first, environment overrides second.
    pub fn load() -> Result<Self> {
        let file = Self::read_config_file()?;

        let data_dir = std::env::var_os("JOT_DATA_DIR")
            .map(PathBuf::from)
            .or(file.data_dir)
            .unwrap_or_else(default_data_dir);

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let api_key = std::env::var("JOT_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .or(file.ai.api_key);

        let base_url = std::env::var("JOT_API_BASE")
            .ok()
            .or(file.ai.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let model = std::env::var("JOT_MODEL")
            .ok()
            .or(file.ai.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout_secs = std::env::var("JOT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.ai.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            data_dir,
            ai: AiConfig {
                api_key,
                base_url,
                model,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }

    fn read_config_file() -> Result<ConfigFile> {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };

        let path = config_dir.join("jot").join("config.toml");
        if !path.exists() {
            return Ok(ConfigFile::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("jot"))
        .unwrap_or_else(|| PathBuf::from(".jot"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_parses_partial_toml() -> Result<()> {
        let file: ConfigFile = toml::from_str(
            r#"
            [ai]
            model = "gpt-4o"
            timeout_secs = 10
            "#,
        )?;

        assert_eq!(file.ai.model.as_deref(), Some("gpt-4o"));
        assert_eq!(file.ai.timeout_secs, Some(10));
        assert!(file.ai.api_key.is_none());
        assert!(file.data_dir.is_none());
        Ok(())
    }

    #[test]
    fn test_config_file_parses_empty_toml() -> Result<()> {
        let file: ConfigFile = toml::from_str("")?;
        assert!(file.ai.base_url.is_none());
        Ok(())
    }
}
