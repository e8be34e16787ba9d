// Per-file pipeline: Queued -> Extracting -> Classifying -> Done

use bytes::Bytes;
use tracing::{debug, warn};

use super::coordinator::PipelineServices;
use super::worker_pool::PoolError;
use crate::classifier::ClassifierError;
use crate::extraction::ExtractionError;
use crate::formats::DocumentFormat;
use crate::models::{FileOutcome, UploadedFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStage {
    Queued,
    Extracting,
    Classifying,
    Done,
}

/// Everything that can end a file task early. Rendered into the file's
/// `Failure` message; never escapes the task.
#[derive(Debug, thiserror::Error)]
pub enum FileTaskError {
    #[error("File type not recognised")]
    UnsupportedType,

    #[error("No text extracted from the file")]
    NoTextExtracted,

    #[error("Error processing file: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Classification failed: {0}")]
    Classification(#[from] ClassifierError),

    #[error("Classifier returned no labels")]
    NoLabels,

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Result of the extraction stage.
#[derive(Debug)]
pub enum ExtractionOutcome {
    Text(String),
    NoTextExtracted,
    UnsupportedType,
    Failed(FileTaskError),
}

impl ExtractionOutcome {
    pub fn into_text(self) -> Result<String, FileTaskError> {
        match self {
            ExtractionOutcome::Text(text) => Ok(text),
            ExtractionOutcome::NoTextExtracted => Err(FileTaskError::NoTextExtracted),
            ExtractionOutcome::UnsupportedType => Err(FileTaskError::UnsupportedType),
            ExtractionOutcome::Failed(err) => Err(err),
        }
    }
}

/// Carry one file to its outcome.
pub async fn run(services: &PipelineServices, file: UploadedFile) -> FileOutcome {
    let UploadedFile {
        filename,
        format,
        content,
    } = file;
    debug!(filename = %filename, stage = ?TaskStage::Queued, "Starting classification for file");

    let outcome = match process(services, &filename, format, content).await {
        Ok(label) => {
            debug!(filename = %filename, label = %label, "Completed classification for file");
            FileOutcome::Success(label)
        }
        Err(err) => {
            warn!(filename = %filename, error = %err, "Error processing file");
            FileOutcome::Failure(err.to_string())
        }
    };
    debug!(filename = %filename, stage = ?TaskStage::Done, "File task finished");
    outcome
}

async fn process(
    services: &PipelineServices,
    filename: &str,
    format: DocumentFormat,
    content: Bytes,
) -> Result<String, FileTaskError> {
    debug!(filename = %filename, stage = ?TaskStage::Extracting, size = content.len());
    let text = extract(services, format, content).await.into_text()?;

    debug!(filename = %filename, stage = ?TaskStage::Classifying, chars = text.len());
    let ranked = services
        .pool
        .run(services.classifier.classify(&text, services.labels.as_slice()))
        .await??;

    // the classifier's order is authoritative
    ranked.into_iter().next().ok_or(FileTaskError::NoLabels)
}

/// Route and run the extractor on the worker pool. `content` is moved into
/// the job and dropped once extraction returns.
pub async fn extract(
    services: &PipelineServices,
    format: DocumentFormat,
    content: Bytes,
) -> ExtractionOutcome {
    let Some(extractor) = services.extractors.route(format) else {
        return ExtractionOutcome::UnsupportedType;
    };

    let result = services
        .pool
        .run_blocking(move || extractor.extract(&content, format))
        .await;

    match result {
        Err(err) => ExtractionOutcome::Failed(err.into()),
        Ok(Err(err)) => ExtractionOutcome::Failed(err.into()),
        Ok(Ok(text)) if text.trim().is_empty() => ExtractionOutcome::NoTextExtracted,
        Ok(Ok(text)) => ExtractionOutcome::Text(text),
    }
}
