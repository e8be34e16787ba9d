use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::classifier::DEFAULT_CANDIDATE_LABELS;

pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 100 * 1024 * 1024;
pub const DEFAULT_CLASSIFIER_URL: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-mnli";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub workers: WorkerConfig,
    pub classifier: ClassifierConfig,
    pub ocr: OcrConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Multipart field name carrying the uploaded files
    pub field_name: String,
    /// Per-file ceiling in bytes
    pub max_file_size: usize,
    /// Whole request body ceiling in bytes
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    pub pool_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierBackend {
    Keyword,
    ZeroShot,
}

impl FromStr for ClassifierBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "keyword" => Ok(ClassifierBackend::Keyword),
            "zero-shot" | "zeroshot" | "zero_shot" => Ok(ClassifierBackend::ZeroShot),
            other => bail!("Unknown classifier backend: {}", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub backend: ClassifierBackend,
    pub url: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    pub max_input_chars: usize,
    pub candidate_labels: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub tessdata_dir: Option<PathBuf>,
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let default_pool = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .to_string();

        let candidate_labels = match lookup("CANDIDATE_LABELS") {
            Some(raw) => split_list(&raw),
            None => DEFAULT_CANDIDATE_LABELS.iter().map(|s| s.to_string()).collect(),
        };
        if candidate_labels.is_empty() {
            bail!("CANDIDATE_LABELS must contain at least one label");
        }

        let pool_size: usize = parse_var("WORKER_POOL_SIZE", &var("WORKER_POOL_SIZE", &default_pool))?;
        if pool_size == 0 {
            bail!("WORKER_POOL_SIZE must be greater than zero");
        }

        Ok(Self {
            server: ServerConfig {
                port: parse_var("PORT", &var("PORT", "5000"))?,
                host: var("HOST", "0.0.0.0"),
                cors_allowed_origins: split_list(&var("ALLOWED_ORIGINS", "*")),
            },
            upload: UploadConfig {
                field_name: var("UPLOAD_FIELD_NAME", "file"),
                max_file_size: parse_var(
                    "MAX_FILE_SIZE",
                    &var("MAX_FILE_SIZE", &DEFAULT_MAX_FILE_SIZE.to_string()),
                )?,
                max_request_size: parse_var(
                    "MAX_REQUEST_SIZE",
                    &var("MAX_REQUEST_SIZE", &DEFAULT_MAX_REQUEST_SIZE.to_string()),
                )?,
            },
            workers: WorkerConfig { pool_size },
            classifier: ClassifierConfig {
                backend: var("CLASSIFIER_BACKEND", "keyword").parse()?,
                url: var("CLASSIFIER_URL", DEFAULT_CLASSIFIER_URL),
                api_token: lookup("CLASSIFIER_API_TOKEN").filter(|t| !t.is_empty()),
                timeout_secs: parse_var("CLASSIFIER_TIMEOUT_SECS", &var("CLASSIFIER_TIMEOUT_SECS", "60"))?,
                max_input_chars: parse_var(
                    "CLASSIFIER_MAX_INPUT_CHARS",
                    &var("CLASSIFIER_MAX_INPUT_CHARS", "4000"),
                )?,
                candidate_labels,
            },
            ocr: OcrConfig {
                tessdata_dir: lookup("TESSDATA_DIR").filter(|d| !d.is_empty()).map(PathBuf::from),
                language: var("OCR_LANGUAGE", "eng"),
            },
            logging: LoggingConfig {
                log_dir: lookup("LOG_DIR").filter(|d| !d.is_empty()).map(PathBuf::from),
            },
        })
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.upload.field_name, "file");
        assert_eq!(config.upload.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.classifier.backend, ClassifierBackend::Keyword);
        assert_eq!(config.classifier.candidate_labels.len(), 7);
        assert_eq!(config.classifier.candidate_labels[0], "invoice");
        assert!(config.workers.pool_size >= 1);
        assert!(config.ocr.tessdata_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("MAX_FILE_SIZE", "1024"),
            ("WORKER_POOL_SIZE", "3"),
            ("CLASSIFIER_BACKEND", "zero-shot"),
            ("CANDIDATE_LABELS", "receipt, contract ,"),
            ("CLASSIFIER_API_TOKEN", ""),
        ])
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.upload.max_file_size, 1024);
        assert_eq!(config.workers.pool_size, 3);
        assert_eq!(config.classifier.backend, ClassifierBackend::ZeroShot);
        assert_eq!(config.classifier.candidate_labels, vec!["receipt", "contract"]);
        assert!(config.classifier.api_token.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("WORKER_POOL_SIZE", "0")]).is_err());
        assert!(config_from(&[("CANDIDATE_LABELS", " , ")]).is_err());
        assert!(config_from(&[("CLASSIFIER_BACKEND", "bayes")]).is_err());
    }
}
