use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use mockweave_generate::{DEFAULT_MAX_UNIQUE_ATTEMPTS, GenerateOptions};

use crate::CliError;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "mockweave.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub generate: GenerateSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateSection {
    pub seed: Option<u64>,
    pub max_unique_attempts: u32,
    pub pretty: bool,
}

impl Default for GenerateSection {
    fn default() -> Self {
        Self {
            seed: None,
            max_unique_attempts: DEFAULT_MAX_UNIQUE_ATTEMPTS,
            pretty: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl CliConfig {
    /// Engine options with an optional `--seed` taking precedence.
    pub fn generate_options(&self, seed: Option<u64>) -> GenerateOptions {
        GenerateOptions {
            seed: seed.or(self.generate.seed),
            max_unique_attempts: self.generate.max_unique_attempts,
        }
    }
}

/// Load `explicit`, or `mockweave.toml` when present, or defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<CliConfig, CliError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !fallback.exists() {
                return Ok(CliConfig::default());
            }
            fallback
        }
    };

    let content = std::fs::read_to_string(&path).map_err(|source| CliError::Read {
        path: path.clone(),
        source,
    })?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<CliConfig, CliError> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [generate]
            seed = 7

            [logging]
            format = "json"
            "#,
        )
        .expect("parse");

        assert_eq!(config.generate.seed, Some(7));
        assert_eq!(config.generate.max_unique_attempts, DEFAULT_MAX_UNIQUE_ATTEMPTS);
        assert!(!config.generate.pretty);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn flag_seed_overrides_file_seed() {
        let config = parse_config("[generate]\nseed = 1\nmax_unique_attempts = 25\n").expect("parse");
        let options = config.generate_options(Some(9));
        assert_eq!(options.seed, Some(9));
        assert_eq!(options.max_unique_attempts, 25);
        assert_eq!(config.generate_options(None).seed, Some(1));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(parse_config("[logging]\nformat = \"xml\"\n").is_err());
    }
}
