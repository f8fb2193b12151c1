use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::edirect::EdirectSettings;
use crate::error::LineageError;

pub const DEFAULT_OUTPUT_PREFIX: &str = "lineage";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Optional JSON settings file. Every field may be omitted.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub output_prefix: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub nucleotide_db: Option<String>,
    #[serde(default)]
    pub taxonomy_db: Option<String>,
}

/// Command-line values, which take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub output_prefix: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub input_file: PathBuf,
    pub output_prefix: Utf8PathBuf,
    pub edirect: EdirectSettings,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(
        input_file: &Path,
        config_path: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, LineageError> {
        let config = match config_path {
            Some(path) => Self::read(path)?,
            None => Config::default(),
        };
        Self::resolve_config(input_file, config, overrides)
    }

    pub fn read(path: &Path) -> Result<Config, LineageError> {
        let content =
            fs::read_to_string(path).map_err(|_| LineageError::ConfigRead(path.to_path_buf()))?;
        serde_json::from_str(&content).map_err(|err| LineageError::ConfigParse(err.to_string()))
    }

    pub fn resolve_config(
        input_file: &Path,
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, LineageError> {
        let output_prefix = overrides
            .output_prefix
            .or(config.output_prefix)
            .unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string());
        if output_prefix.trim().is_empty() {
            return Err(LineageError::InvalidConfig(
                "output prefix must not be empty".to_string(),
            ));
        }

        let timeout_secs = overrides
            .timeout_secs
            .or(config.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(LineageError::InvalidConfig(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        let defaults = EdirectSettings::default();
        Ok(ResolvedConfig {
            input_file: input_file.to_path_buf(),
            output_prefix: Utf8PathBuf::from(output_prefix),
            edirect: EdirectSettings {
                timeout: Duration::from_secs(timeout_secs),
                nucleotide_db: config.nucleotide_db.unwrap_or(defaults.nucleotide_db),
                taxonomy_db: config.taxonomy_db.unwrap_or(defaults.taxonomy_db),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let resolved = ConfigLoader::resolve_config(
            Path::new("accessions.txt"),
            Config::default(),
            ConfigOverrides::default(),
        )
        .unwrap();
        assert_eq!(resolved.output_prefix.as_str(), "lineage");
        assert_eq!(resolved.edirect.timeout, Duration::from_secs(30));
        assert_eq!(resolved.edirect.nucleotide_db, "nucleotide");
        assert_eq!(resolved.edirect.taxonomy_db, "taxonomy");
    }
}
