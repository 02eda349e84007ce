//! Application settings
//!
//! Loaded once at startup from a JSON file (every field optional) and then
//! overridden from the environment. The resulting `Settings` is immutable and
//! shared behind an `Arc` by the CLI and the server.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::classification::Strategy;
use crate::error::{Result, ScanError};

/// File name looked up in the working directory
pub const LOCAL_CONFIG_NAME: &str = "scholarscan.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Restrictive-eligibility phrases, matched case-insensitively
    #[serde(default = "default_phrases")]
    pub phrases: Vec<String>,
    /// Which classifier answers scan/upload/analyze requests
    #[serde(default)]
    pub strategy: Strategy,
    /// Ollama-style generate endpoint
    #[serde(default = "default_model_endpoint")]
    pub model_endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Instruction placed before the document text in the model prompt
    #[serde(default = "default_instruction")]
    pub instruction: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Truncate document text sent to the model (None = send everything)
    #[serde(default)]
    pub max_prompt_bytes: Option<usize>,
    /// Log file used by the CLI scan command
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Where uploads are staged while being extracted
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// When set, the server appends a log entry per classified upload
    #[serde(default)]
    pub server_log_file: Option<PathBuf>,
}

fn default_phrases() -> Vec<String> {
    ["Female Only", "STEM Major Only", "Service Member Only", "International only"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_model_endpoint() -> String {
    "http://localhost:11434/api/generate".to_string()
}

fn default_model() -> String {
    "qwen2.5:7b".to_string()
}

fn default_instruction() -> String {
    concat!(
        "You are reviewing a scholarship or program document. Decide whether it restricts ",
        "eligibility to a specific group of applicants, for example by gender, field of study, ",
        "military service or citizenship.\n",
        "Respond with a single JSON object and nothing else:\n",
        "{\"is_applicable\": true|false, \"confidence\": 0.0-1.0, ",
        "\"matched_phrases\": [\"...\"], \"reasoning\": \"one or two sentences\"}\n",
        "Set \"is_applicable\" to true only if such a restriction is present."
    )
    .to_string()
}

fn default_request_timeout() -> u64 {
    120
}

fn default_log_file() -> PathBuf {
    PathBuf::from("scan_log.txt")
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            phrases: default_phrases(),
            strategy: Strategy::default(),
            model_endpoint: default_model_endpoint(),
            model: default_model(),
            instruction: default_instruction(),
            request_timeout_secs: default_request_timeout(),
            max_prompt_bytes: None,
            log_file: default_log_file(),
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
            upload_dir: default_upload_dir(),
            server_log_file: None,
        }
    }
}

impl Settings {
    /// Load settings from disk, or defaults if the file does not exist.
    ///
    /// A file that exists but does not parse is an error rather than a
    /// silent fallback, so a typo never quietly changes the phrase set.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ScanError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve the config file, load it and apply environment overrides.
    pub fn resolve(config_arg: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = find_config(config_arg);
        let mut settings = match &path {
            Some(p) => Settings::load(p)?,
            None => Settings::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok((settings, path))
    }

    /// Environment variables take precedence over the stored file.
    ///
    /// `lookup` is the environment in production and a map in tests.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(strategy) = get("SCHOLARSCAN_STRATEGY") {
            self.strategy = strategy.parse().map_err(ScanError::Config)?;
        }
        if let Some(url) = get("SCHOLARSCAN_MODEL_URL") {
            self.model_endpoint = url;
        }
        if let Some(model) = get("SCHOLARSCAN_MODEL") {
            self.model = model;
        }
        if let Some(bind) = get("SCHOLARSCAN_BIND") {
            self.bind = bind;
        }
        if let Some(log_file) = get("SCHOLARSCAN_LOG_FILE") {
            self.log_file = PathBuf::from(log_file);
        }
        Ok(())
    }
}

/// Locate the settings file.
///
/// 1. `--config` argument
/// 2. `SCHOLARSCAN_CONFIG` environment variable
/// 3. `./scholarscan.json`
/// 4. `<config dir>/scholarscan/settings.json`
pub fn find_config(config_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = config_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("SCHOLARSCAN_CONFIG") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let local = PathBuf::from(LOCAL_CONFIG_NAME);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|p| p.join("scholarscan").join("settings.json"))
        .filter(|p| p.exists())
}
