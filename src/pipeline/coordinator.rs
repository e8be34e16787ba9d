//! Batch Coordinator
//!
//! Fans a validated batch out into one task per file and gathers the
//! outcomes back into [`BatchResults`]. Results are keyed by filename and
//! keep validation order regardless of which task finishes first. A task
//! that dies (panic, cancellation) only fails its own file.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::file_task;
use super::worker_pool::{PoolError, WorkerPool};
use crate::classifier::{CandidateLabels, Classifier};
use crate::extraction::ExtractorRegistry;
use crate::models::{BatchResults, FileOutcome, UploadedFile};

/// Shared, read-only collaborators of every file task.
pub struct PipelineServices {
    pub extractors: ExtractorRegistry,
    pub classifier: Arc<dyn Classifier>,
    pub labels: CandidateLabels,
    pub pool: WorkerPool,
}

#[derive(Clone)]
pub struct BatchCoordinator {
    services: Arc<PipelineServices>,
}

impl BatchCoordinator {
    pub fn new(
        extractors: ExtractorRegistry,
        classifier: Arc<dyn Classifier>,
        labels: CandidateLabels,
        pool: WorkerPool,
    ) -> Self {
        Self {
            services: Arc::new(PipelineServices {
                extractors,
                classifier,
                labels,
                pool,
            }),
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.services.pool
    }

    pub fn classifier_name(&self) -> &str {
        self.services.classifier.name()
    }

    pub fn labels(&self) -> &CandidateLabels {
        &self.services.labels
    }

    /// Process every file concurrently and wait for all of them.
    pub async fn process(&self, files: Vec<UploadedFile>) -> BatchResults {
        let batch_id = Uuid::new_v4();
        let span = info_span!("batch", %batch_id, files = files.len());
        self.process_inner(files).instrument(span).await
    }

    async fn process_inner(&self, files: Vec<UploadedFile>) -> BatchResults {
        info!("Processing batch");

        let mut filenames = Vec::with_capacity(files.len());
        let mut handles = Vec::with_capacity(files.len());
        for file in files {
            debug!(filename = %file.filename, format = %file.format, "Creating task for file");
            filenames.push(file.filename.clone());

            let services = Arc::clone(&self.services);
            let span = tracing::Span::current();
            handles.push(tokio::spawn(
                async move { file_task::run(&services, file).await }.instrument(span),
            ));
        }

        let joined = join_all(handles).await;

        let mut results = BatchResults::new();
        for (filename, outcome) in filenames.into_iter().zip(joined) {
            let outcome = outcome.unwrap_or_else(|err| {
                let err = PoolError::from(err);
                error!(filename = %filename, error = %err, "File task died");
                FileOutcome::Failure(err.to_string())
            });
            if results.insert(filename.clone(), outcome).is_some() {
                warn!(filename = %filename, "Duplicate filename in batch, keeping the later result");
            }
        }

        info!(
            succeeded = results.success_count(),
            total = results.len(),
            "Batch complete"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierError, KeywordClassifier};
    use crate::extraction::{ExtractionError, Extractor};
    use crate::formats::{DocumentFormat, FormatFamily};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Treats the file content as its text. Magic prefixes drive failures.
    struct EchoExtractor;

    impl Extractor for EchoExtractor {
        fn extract(&self, content: &[u8], _format: DocumentFormat) -> Result<String, ExtractionError> {
            let text = String::from_utf8_lossy(content).to_string();
            if text.starts_with("PANIC") {
                panic!("extractor blew up");
            }
            if text.starts_with("BROKEN") {
                return Err(ExtractionError::Pdf("invalid xref table".into()));
            }
            if let Some(rest) = text.strip_prefix("SLEEP") {
                let (ms, body) = rest.split_once(':').unwrap_or((rest, ""));
                std::thread::sleep(Duration::from_millis(ms.parse().unwrap_or(0)));
                return Ok(body.to_string());
            }
            Ok(text)
        }
    }

    struct CountingExtractor {
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl Extractor for CountingExtractor {
        fn extract(&self, _content: &[u8], _format: DocumentFormat) -> Result<String, ExtractionError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(15));
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok("invoice total due".into())
        }
    }

    /// Puts the first label mentioned in the text on top.
    struct MentionClassifier;

    #[async_trait]
    impl Classifier for MentionClassifier {
        async fn classify(&self, text: &str, labels: &[String]) -> Result<Vec<String>, ClassifierError> {
            if text.contains("FAIL") {
                return Err(ClassifierError::Api {
                    status: 503,
                    message: "model loading".into(),
                });
            }
            if text.contains("NOLABELS") {
                return Ok(vec![]);
            }
            if text.contains("CRASH") {
                panic!("classifier crashed");
            }
            let mut ranked = labels.to_vec();
            if let Some(pos) = ranked.iter().position(|l| text.contains(l.as_str())) {
                let hit = ranked.remove(pos);
                ranked.insert(0, hit);
            }
            Ok(ranked)
        }

        fn name(&self) -> &str {
            "mention"
        }
    }

    fn echo_registry() -> ExtractorRegistry {
        ExtractorRegistry::new()
            .register(FormatFamily::Pdf, EchoExtractor)
            .register(FormatFamily::Csv, EchoExtractor)
            .register(FormatFamily::WordDocument, EchoExtractor)
    }

    fn coordinator(pool_size: usize) -> BatchCoordinator {
        BatchCoordinator::new(
            echo_registry(),
            Arc::new(MentionClassifier),
            CandidateLabels::default(),
            WorkerPool::new(pool_size),
        )
    }

    fn file(name: &str, content: &str) -> UploadedFile {
        UploadedFile {
            filename: name.into(),
            format: DocumentFormat::from_filename(name).unwrap(),
            content: Bytes::copy_from_slice(content.as_bytes()),
        }
    }

    fn failure(results: &BatchResults, name: &str) -> String {
        results.get(name).and_then(|o| o.error()).unwrap().to_string()
    }

    #[tokio::test]
    async fn test_partial_failures_do_not_affect_siblings() {
        let results = coordinator(4)
            .process(vec![
                file("good.pdf", "Invoice number 42, this is an invoice"),
                file("scan.png", "pixels"),
                file("blank.csv", "   \n\t"),
                file("corrupt.pdf", "BROKEN"),
                file("flaky.docx", "FAIL please"),
                file("empty_rank.docx", "NOLABELS"),
            ])
            .await;

        assert_eq!(results.len(), 6);
        assert_eq!(results.get("good.pdf").and_then(|o| o.label()), Some("invoice"));
        assert_eq!(failure(&results, "scan.png"), "File type not recognised");
        assert_eq!(failure(&results, "blank.csv"), "No text extracted from the file");
        assert_eq!(
            failure(&results, "corrupt.pdf"),
            "Error processing file: Failed to parse PDF: invalid xref table"
        );
        assert!(failure(&results, "flaky.docx").starts_with("Classification failed: "));
        assert_eq!(failure(&results, "empty_rank.docx"), "Classifier returned no labels");
        assert_eq!(results.success_count(), 1);
    }

    #[tokio::test]
    async fn test_results_follow_input_order_not_completion_order() {
        let results = coordinator(4)
            .process(vec![
                file("slow.pdf", "SLEEP80:passport number"),
                file("medium.csv", "SLEEP30:bank statement"),
                file("fast.docx", "cv"),
            ])
            .await;

        let names: Vec<_> = results.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["slow.pdf", "medium.csv", "fast.docx"]);
        assert_eq!(results.get("slow.pdf").and_then(|o| o.label()), Some("passport"));
        assert_eq!(results.get("medium.csv").and_then(|o| o.label()), Some("bank statement"));
        assert_eq!(results.get("fast.docx").and_then(|o| o.label()), Some("cv"));
    }

    #[tokio::test]
    async fn test_duplicate_filenames_collapse_to_last() {
        let results = coordinator(2)
            .process(vec![
                file("same.pdf", "SLEEP40:invoice"),
                file("same.pdf", "passport"),
            ])
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results.get("same.pdf").and_then(|o| o.label()), Some("passport"));
    }

    #[tokio::test]
    async fn test_extractor_panic_is_isolated() {
        let results = coordinator(2)
            .process(vec![file("boom.pdf", "PANIC"), file("fine.csv", "cv")])
            .await;

        assert_eq!(failure(&results, "boom.pdf"), "Worker panicked: extractor blew up");
        assert_eq!(results.get("fine.csv").and_then(|o| o.label()), Some("cv"));
    }

    #[tokio::test]
    async fn test_classifier_panic_is_isolated() {
        let coordinator = coordinator(2);
        let results = coordinator
            .process(vec![file("crash.pdf", "CRASH"), file("fine.csv", "invoice")])
            .await;

        assert_eq!(failure(&results, "crash.pdf"), "Worker panicked: classifier crashed");
        assert_eq!(results.get("fine.csv").and_then(|o| o.label()), Some("invoice"));
        // the dead task's permit was released
        assert_eq!(coordinator.pool().available(), 2);
    }

    #[tokio::test]
    async fn test_extraction_concurrency_is_bounded_by_pool() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let registry = ExtractorRegistry::new().register(
            FormatFamily::Pdf,
            CountingExtractor {
                running: running.clone(),
                peak: peak.clone(),
            },
        );
        let coordinator = BatchCoordinator::new(
            registry,
            Arc::new(MentionClassifier),
            CandidateLabels::default(),
            WorkerPool::new(2),
        );

        let files = (0..10).map(|i| file(&format!("doc{i}.pdf"), "x")).collect();
        let results = coordinator.process(files).await;

        assert_eq!(results.len(), 10);
        assert_eq!(results.success_count(), 10);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_same_input_gives_same_results() {
        let coordinator = BatchCoordinator::new(
            echo_registry(),
            Arc::new(KeywordClassifier::new()),
            CandidateLabels::default(),
            WorkerPool::new(3),
        );
        let batch = || {
            vec![
                file("a.pdf", "INVOICE\nAmount due: 120.00\nVAT"),
                file("b.csv", "Date,Description,Debit,Credit,Balance"),
            ]
        };

        let first = coordinator.process(batch()).await;
        let second = coordinator.process(batch()).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_closed_pool_fails_every_file() {
        let coordinator = coordinator(2);
        coordinator.pool().close();

        let results = coordinator
            .process(vec![file("a.pdf", "invoice"), file("b.csv", "cv")])
            .await;

        assert_eq!(failure(&results, "a.pdf"), "Worker pool is shut down");
        assert_eq!(failure(&results, "b.csv"), "Worker pool is shut down");
    }
}
