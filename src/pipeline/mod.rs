//! Batch Processing Pipeline
//!
//! validate -> fan out one task per file -> extract -> classify -> gather.
//! Extraction and classification run under a shared [`WorkerPool`] so a
//! single request cannot take over the host.

pub mod coordinator;
pub mod file_task;
pub mod validator;
pub mod worker_pool;

pub use coordinator::{BatchCoordinator, PipelineServices};
pub use file_task::{ExtractionOutcome, FileTaskError, TaskStage};
pub use validator::{BatchRejection, RequestValidator};
pub use worker_pool::{PoolError, WorkerPool};
