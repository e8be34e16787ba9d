use tracing::{debug, error, warn};

use crate::formats::DocumentFormat;
use crate::models::{RawUpload, UploadedFile};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Batch-level rejection. No file task is created when one of these is raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchRejection {
    #[error("No files provided")]
    EmptyBatch,

    #[error("No valid files to process")]
    NoValidFiles,

    #[error("File exceeds the maximum allowed size of {} MB", megabytes(.limit_bytes))]
    PayloadTooLarge { limit_bytes: usize },

    #[error("Malformed upload: {0}")]
    Malformed(String),

    #[error("Request body too large: {0}")]
    BodyTooLarge(String),
}

/// Shortest round-trip float form, always with a fractional part
/// (`10.0`, `1.0000009536743164`).
fn megabytes(bytes: &usize) -> String {
    let mb = *bytes as f64 / BYTES_PER_MB;
    if mb.fract() == 0.0 {
        format!("{:.1}", mb)
    } else {
        format!("{}", mb)
    }
}

/// Filters a raw upload list down to the files worth processing.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    max_file_size: usize,
}

impl RequestValidator {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Rules per file, in order: empty filename is skipped silently, an
    /// unsupported extension is skipped with a warning, an oversized file
    /// rejects the whole batch. Input order is preserved.
    pub fn validate(&self, uploads: Vec<RawUpload>) -> Result<Vec<UploadedFile>, BatchRejection> {
        if uploads.is_empty() {
            return Err(BatchRejection::EmptyBatch);
        }
        debug!(count = uploads.len(), "Validating uploaded files");

        let mut admitted = Vec::with_capacity(uploads.len());
        for upload in uploads {
            if upload.filename.is_empty() {
                continue;
            }

            let Some(format) = DocumentFormat::from_filename(&upload.filename) else {
                warn!(filename = %upload.filename, "Skipping file with unsupported type");
                continue;
            };

            if upload.content.len() > self.max_file_size {
                error!(
                    filename = %upload.filename,
                    size = upload.content.len(),
                    limit = self.max_file_size,
                    "Rejecting batch due to size limit"
                );
                return Err(BatchRejection::PayloadTooLarge {
                    limit_bytes: self.max_file_size,
                });
            }

            admitted.push(UploadedFile {
                filename: upload.filename,
                format,
                content: upload.content,
            });
        }

        if admitted.is_empty() {
            return Err(BatchRejection::NoValidFiles);
        }
        Ok(admitted)
    }
}
