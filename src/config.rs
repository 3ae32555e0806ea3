//! TOML configuration parsing and validation.
//!
//! # Example
//!
//! ```toml
//! [db]
//! path = "./data/forge.sqlite"
//!
//! [generation]
//! provider = "openai"
//! model = "gpt-4.1-2025-04-14"
//! temperature = 0.7
//! max_tokens = 4000
//! timeout_secs = 60
//! pacing_ms = 150
//!
//! [storage]
//! backend = "filesystem"
//! root = "./data/blobs"
//! public_base_url = "http://127.0.0.1:7341/files"
//!
//! [server]
//! bind = "127.0.0.1:7341"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use topicforge_core::generation::GenerationSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "default_generation_url")]
    pub url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Deadline for a single generation call.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
    /// Delay inserted after every generation call.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            url: default_generation_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout(),
            pacing_ms: default_pacing_ms(),
        }
    }
}

impl GenerationConfig {
    pub fn settings(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4.1-2025-04-14".to_string()
}
fn default_generation_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_generation_timeout() -> u64 {
    60
}
fn default_pacing_ms() -> u64 {
    150
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Root directory for the filesystem backend.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Prefix for public download URLs of filesystem blobs.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub s3: Option<S3StorageConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            root: default_storage_root(),
            public_base_url: default_public_base_url(),
            timeout_secs: default_storage_timeout(),
            s3: None,
        }
    }
}

fn default_backend() -> String {
    "filesystem".to_string()
}
fn default_storage_root() -> PathBuf {
    PathBuf::from("./data/blobs")
}
fn default_public_base_url() -> String {
    "http://127.0.0.1:7341/files".to_string()
}
fn default_storage_timeout() -> u64 {
    30
}

/// S3-compatible bucket used by the `s3` storage backend.
#[derive(Debug, Deserialize, Clone)]
pub struct S3StorageConfig {
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Key prefix prepended to every artifact path.
    #[serde(default)]
    pub prefix: String,
    /// Custom endpoint (MinIO, LocalStack, ...). Uses path-style addressing.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Overrides the URL prefix used for public download links.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:7341".to_string(),
        }
    }
}

impl Config {
    /// Defaults suitable for tests and commands that run without a file.
    /// Generation is disabled and blobs go under `./data/blobs`.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/forge.sqlite"),
            },
            generation: GenerationConfig {
                provider: "disabled".to_string(),
                ..Default::default()
            },
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    match config.generation.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    if !(0.0..=2.0).contains(&config.generation.temperature) {
        anyhow::bail!("generation.temperature must be in [0.0, 2.0]");
    }
    if config.generation.max_tokens == 0 {
        anyhow::bail!("generation.max_tokens must be > 0");
    }
    if config.generation.timeout_secs == 0 {
        anyhow::bail!("generation.timeout_secs must be > 0");
    }

    match config.storage.backend.as_str() {
        "filesystem" => {}
        "s3" => {
            if config.storage.s3.is_none() {
                anyhow::bail!("storage.s3 must be configured when backend is 's3'");
            }
        }
        other => anyhow::bail!(
            "Unknown storage backend: '{}'. Must be filesystem or s3.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse("[db]\npath = \"/tmp/forge.sqlite\"\n").unwrap();
        assert_eq!(config.generation.provider, "openai");
        assert_eq!(config.generation.pacing_ms, 150);
        assert_eq!(config.storage.backend, "filesystem");
        assert_eq!(config.server.bind, "127.0.0.1:7341");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = parse("[db]\npath = \"x\"\n[generation]\nprovider = \"llama\"\n").unwrap_err();
        assert!(err.to_string().contains("Unknown generation provider"));
    }

    #[test]
    fn test_temperature_bounds() {
        assert!(parse("[db]\npath = \"x\"\n[generation]\ntemperature = 3.5\n").is_err());
    }

    #[test]
    fn test_s3_backend_requires_bucket_section() {
        assert!(parse("[db]\npath = \"x\"\n[storage]\nbackend = \"s3\"\n").is_err());
        let ok = parse(
            "[db]\npath = \"x\"\n[storage]\nbackend = \"s3\"\n[storage.s3]\nbucket = \"artifacts\"\n",
        )
        .unwrap();
        assert_eq!(ok.storage.s3.unwrap().region, "us-east-1");
    }
}
