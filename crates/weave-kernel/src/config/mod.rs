//! Ambient configuration loader for applications embedding the engine.
//!
//! Not required to construct or run an `Engine` — `Engine::new()` needs
//! no configuration at all. This module exists for applications that
//! want to externalize engine-adjacent settings (default timeouts,
//! worker pool sizing hints) in YAML/TOML/JSON with environment
//! variable substitution, gated behind the `config` feature.

use config::{Config as Cfg, FileFormat};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings an embedding application may supply to tune engine
/// defaults. The core engine never reads these directly; callers wire
/// them into their own `Engine` construction.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineSettings {
    #[serde(default, with = "duration_millis_opt")]
    pub default_timeout: Option<Duration>,
    #[serde(default)]
    pub worker_hint: Option<usize>,
}

mod duration_millis_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        value.map(|d| d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parsing error: {0}")]
    Parse(String),

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("config deserialization error: {0}")]
    Deserialize(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Detects format from a file's extension (yaml/yml, toml, json).
pub fn detect_format(path: &str) -> ConfigResult<FileFormat> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("no file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Substitutes `${VAR}` and `${VAR:-default}` references with
/// environment variable values, leaving unresolved references in
/// place (braced syntax only — plain `$VAR` is intentionally not
/// supported to avoid false positives inside YAML/TOML literals that
/// contain a bare dollar sign).
pub fn substitute_env_vars(content: &str) -> String {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}").unwrap();

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match std::env::var(var_name) {
            Ok(value) => value,
            Err(_) => caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_else(|| caps[0].to_string()),
        }
    })
    .to_string()
}

/// Loads and deserializes `EngineSettings` (or any `DeserializeOwned`
/// type) from a file, auto-detecting format and substituting
/// environment variables first.
pub fn load_config<T: DeserializeOwned>(path: &str) -> ConfigResult<T> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    from_str(&content, format)
}

/// Deserializes from an in-memory string with an explicit format,
/// substituting environment variables first.
pub fn from_str<T: DeserializeOwned>(content: &str, format: FileFormat) -> ConfigResult<T> {
    let substituted = substitute_env_vars(content);

    let built = Cfg::builder()
        .add_source(config::File::from_str(&substituted, format))
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    built.try_deserialize().map_err(|e| ConfigError::Deserialize(e.to_string()))
}
