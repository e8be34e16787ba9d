use std::collections::HashMap;

use bytes::Bytes;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::Config;
use crate::formats::DocumentFormat;
use crate::pipeline::{BatchCoordinator, RequestValidator};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub validator: RequestValidator,
    pub coordinator: BatchCoordinator,
}

/// One multipart part under the upload field, before validation.
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub filename: String,
    pub content: Bytes,
}

impl RawUpload {
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// A file admitted for processing. Owned by exactly one file task.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub format: DocumentFormat,
    pub content: Bytes,
}

/// Terminal result for one file: `{"result": label}` or `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FileOutcome {
    #[serde(rename = "result")]
    Success(String),
    #[serde(rename = "error")]
    Failure(String),
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Success(_))
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            FileOutcome::Success(label) => Some(label),
            FileOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FileOutcome::Failure(message) => Some(message),
            FileOutcome::Success(_) => None,
        }
    }
}

/// filename -> outcome, in validation order. Serializes as a JSON object.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchResults {
    entries: Vec<(String, FileOutcome)>,
    positions: HashMap<String, usize>,
}

impl BatchResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins; a replaced entry keeps its original position.
    /// Returns the outcome that was overwritten, if any.
    pub fn insert(&mut self, filename: String, outcome: FileOutcome) -> Option<FileOutcome> {
        if let Some(&pos) = self.positions.get(&filename) {
            return Some(std::mem::replace(&mut self.entries[pos].1, outcome));
        }
        self.positions.insert(filename.clone(), self.entries.len());
        self.entries.push((filename, outcome));
        None
    }

    pub fn get(&self, filename: &str) -> Option<&FileOutcome> {
        self.positions
            .get(filename)
            .map(|&pos| &self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileOutcome)> {
        self.entries.iter().map(|(name, outcome)| (name.as_str(), outcome))
    }

    pub fn success_count(&self) -> usize {
        self.entries.iter().filter(|(_, o)| o.is_success()).count()
    }
}

impl Serialize for BatchResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (filename, outcome) in &self.entries {
            map.serialize_entry(filename, outcome)?;
        }
        map.end()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub classifier: String,
    pub worker_pool_size: usize,
}

#[derive(Debug, serde::Serialize)]
pub struct LabelsResponse {
    pub labels: Vec<String>,
}
