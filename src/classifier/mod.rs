//! Document Classification
//!
//! The [`Classifier`] trait ranks a fixed set of candidate labels against a
//! document's text, best match first. Two backends:
//! - [`ZeroShotClient`]: remote zero-shot NLI model over HTTP
//! - [`KeywordClassifier`]: deterministic local keyword ranking

pub mod keyword;
pub mod zero_shot;

pub use keyword::KeywordClassifier;
pub use zero_shot::ZeroShotClient;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{ClassifierBackend, ClassifierConfig};

pub const DEFAULT_CANDIDATE_LABELS: [&str; 7] = [
    "invoice",
    "bank statement",
    "drivers license",
    "passport",
    "credit note",
    "cv",
    "unknown file",
];

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("request to classifier failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("classifier returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected classifier response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Rank `labels` for `text`, best match first.
    async fn classify(&self, text: &str, labels: &[String]) -> Result<Vec<String>, ClassifierError>;

    fn name(&self) -> &str;
}

/// The label set offered to the classifier for every document. Immutable
/// once built.
#[derive(Debug, Clone)]
pub struct CandidateLabels {
    labels: Arc<[String]>,
}

impl CandidateLabels {
    /// Returns `None` for an empty set.
    pub fn new<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return None;
        }
        Some(Self { labels: labels.into() })
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for CandidateLabels {
    fn default() -> Self {
        Self {
            labels: DEFAULT_CANDIDATE_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Build the configured backend.
pub fn from_config(config: &ClassifierConfig) -> Result<Arc<dyn Classifier>, ClassifierError> {
    let classifier: Arc<dyn Classifier> = match config.backend {
        ClassifierBackend::Keyword => Arc::new(KeywordClassifier::new()),
        ClassifierBackend::ZeroShot => Arc::new(ZeroShotClient::from_config(config)?),
    };
    Ok(classifier)
}
