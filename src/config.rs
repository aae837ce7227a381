use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    admission::AdmissionPolicy, auth::AuthConfig, reasoning::ReasoningConfig,
    transcription::TranscriptionConfig,
};

const SCHEMA_FILE_NAME: &str = "advisory.schema.json";
const MIB: usize = 1024 * 1024;

/// Service settings. Every section may be omitted; absent keys take the
/// defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub uploads: UploadConfig,
    pub auth: AuthConfig,
    pub reasoning: ReasoningConfig,
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `"*"` anywhere in the list allows every origin without credentials.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub filter: String,
    pub rotation: LoggingRotation,
    pub retention_days: usize,
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./logs/advisory"),
            filter: "info".to_string(),
            rotation: LoggingRotation::Daily,
            retention_days: 14,
            stderr_warn_enabled: true,
        }
    }
}

/// Shared by the escalation store and the chat-turn store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
    pub max_items: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 900,
            max_items: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub window_seconds: u64,
    pub requests: u64,
    pub max_tracked_keys: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let policy = AdmissionPolicy::default();
        Self {
            enabled: true,
            window_seconds: policy.window.as_secs(),
            requests: policy.limit,
            max_tracked_keys: policy.max_tracked_keys,
        }
    }
}

impl RateLimitConfig {
    pub fn policy(&self) -> AdmissionPolicy {
        AdmissionPolicy {
            limit: self.requests,
            window: Duration::from_secs(self.window_seconds),
            max_tracked_keys: self.max_tracked_keys,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_audio_bytes: usize,
    pub max_image_bytes: usize,
    pub allowed_audio_types: Vec<String>,
    pub allowed_image_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        let owned = |types: &[&str]| types.iter().map(|t| t.to_string()).collect();
        Self {
            max_audio_bytes: 10 * MIB,
            max_image_bytes: 10 * MIB,
            allowed_audio_types: owned(&[
                "audio/wav",
                "audio/x-wav",
                "audio/mpeg",
                "audio/mp3",
                "audio/webm",
                "application/octet-stream",
            ]),
            allowed_image_types: owned(&["image/jpeg", "image/png", "image/webp"]),
        }
    }
}

impl Config {
    /// Reads a JSONC file, checks it against its schema, then deserializes it.
    /// A relative `logging.dir` is anchored at the config file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("unable to read config {}", path.display()))?;
        let document: Value = json5::from_str(&raw)
            .with_context(|| format!("config {} is not valid JSONC", path.display()))?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let schema = schema_location(base_dir, &document)?;
        check_schema(&document, &schema)?;

        let mut config: Config =
            serde_json::from_value(document).context("config does not match advisory settings")?;
        if config.logging.dir.is_relative() {
            config.logging.dir = base_dir.join(&config.logging.dir);
        }
        Ok(config)
    }
}

fn schema_location(base_dir: &Path, document: &Value) -> Result<PathBuf> {
    match document.get("$schema").and_then(Value::as_str) {
        Some(declared) => {
            let declared = Path::new(declared);
            Ok(if declared.is_absolute() {
                declared.to_path_buf()
            } else {
                base_dir.join(declared)
            })
        }
        None => {
            let sibling = base_dir.join(SCHEMA_FILE_NAME);
            if !sibling.is_file() {
                bail!("config has no $schema and no {SCHEMA_FILE_NAME} sits next to it");
            }
            Ok(sibling)
        }
    }
}

fn check_schema(document: &Value, schema_path: &Path) -> Result<()> {
    let schema_text = fs::read_to_string(schema_path)
        .with_context(|| format!("unable to read schema {}", schema_path.display()))?;
    let schema: Value = serde_json::from_str(&schema_text)
        .with_context(|| format!("schema {} is not valid JSON", schema_path.display()))?;
    let validator = JSONSchema::compile(&schema)
        .map_err(|err| anyhow!("schema {} does not compile: {err}", schema_path.display()))?;

    if let Err(errors) = validator.validate(document) {
        let problems: Vec<String> = errors.map(|err| err.to_string()).collect();
        bail!("config validation failed: {}", problems.join("; "));
    }
    Ok(())
}
