use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub chunker: ChunkerSettings,

    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaptureConfig {
    #[serde(default = "default_device_name")]
    pub device_name: String,

    #[serde(default = "default_capture_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_channels")]
    pub channels: u16,

    #[serde(default = "default_buffer_size")]
    pub buffer_size: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            sample_rate: default_capture_rate(),
            channels: default_channels(),
            buffer_size: default_buffer_size(),
        }
    }
}

/// Raw chunking parameters. Validation happens when the chunker is built.
#[derive(Debug, Deserialize, Clone)]
pub struct ChunkerSettings {
    #[serde(default = "default_chunk_length")]
    pub chunk_length_seconds: f64,

    #[serde(default = "default_overlap")]
    pub overlap_seconds: f64,

    #[serde(default = "default_min_chunk")]
    pub min_chunk_seconds: f64,

    /// Rate the engine consumes; frames are resampled down to this.
    #[serde(default = "default_target_rate")]
    pub target_sample_rate: u32,
}

impl Default for ChunkerSettings {
    fn default() -> Self {
        Self {
            chunk_length_seconds: default_chunk_length(),
            overlap_seconds: default_overlap(),
            min_chunk_seconds: default_min_chunk(),
            target_sample_rate: default_target_rate(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_engine_name")]
    pub name: String,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default = "default_true")]
    pub return_timestamps: bool,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Engine-specific settings, forwarded verbatim to `initialize`.
    #[serde(flatten)]
    pub extra: toml::Value,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_engine_name(),
            language: None,
            return_timestamps: default_true(),
            timeout_seconds: default_timeout_seconds(),
            extra: toml::Value::Table(Default::default()),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_device_name() -> String {
    "default".to_string()
}

fn default_capture_rate() -> u32 {
    48000
}

fn default_channels() -> u16 {
    1
}

fn default_buffer_size() -> u32 {
    1024
}

fn default_chunk_length() -> f64 {
    5.0
}

fn default_overlap() -> f64 {
    1.0
}

fn default_min_chunk() -> f64 {
    0.5
}

fn default_target_rate() -> u32 {
    16000
}

fn default_engine_name() -> String {
    "null".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    60
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").expect("static pattern");
    let mut result = input.to_string();
    let mut missing = Vec::new();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => {
                missing.push(var_name.to_string());
            }
        }
    }

    if let Some(first_missing) = missing.into_iter().next() {
        return Err(ConfigError::EnvVarNotFound(first_missing));
    }

    Ok(result)
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let interpolated = interpolate_env_vars(&content)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        tracing::debug!("loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }
}
