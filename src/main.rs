use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use docsort::{
    classifier::{self, CandidateLabels},
    config::Config,
    extraction::{ExtractorRegistry, OcrEngine},
    pipeline::{BatchCoordinator, RequestValidator, WorkerPool},
    routes::create_router,
    utils::init_logging,
    AppState,
};

/// Batch document classification server
#[derive(Debug, Parser)]
#[command(name = "docsort", version, about)]
struct Args {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.env_file {
        dotenvy::from_path(path)
            .with_context(|| format!("Failed to load env file {}", path.display()))?;
    }

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let _log_guard = init_logging(&config.logging);
    info!("Configuration loaded: {:?}", config.server);

    let labels = CandidateLabels::new(config.classifier.candidate_labels.clone())
        .context("Candidate label set is empty")?;
    let classifier = classifier::from_config(&config.classifier)
        .context("Failed to build classifier")?;
    info!(
        backend = classifier.name(),
        labels = labels.len(),
        "Classifier ready"
    );

    let extractors = ExtractorRegistry::with_defaults(ocr_engine(&config));
    let pool = WorkerPool::new(config.workers.pool_size);
    info!(size = pool.size(), "Worker pool ready");

    let coordinator = BatchCoordinator::new(extractors, classifier, labels, pool.clone());
    let state = AppState {
        validator: RequestValidator::new(config.upload.max_file_size),
        coordinator,
        config: config.clone(),
    };

    let app = create_router(state);

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?;
    info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    pool.close();
    info!("Server stopped");

    Ok(())
}

#[cfg(feature = "ocr")]
fn ocr_engine(config: &Config) -> Option<Arc<dyn OcrEngine>> {
    let Some(dir) = &config.ocr.tessdata_dir else {
        warn!("TESSDATA_DIR not set, image files will not be classified");
        return None;
    };
    match docsort::extraction::TesseractOcr::new(dir, &config.ocr.language) {
        Ok(engine) => {
            info!(tessdata = %dir.display(), language = %config.ocr.language, "OCR engine ready");
            Some(Arc::new(engine))
        }
        Err(e) => {
            warn!(error = %e, "OCR engine unavailable, image files will not be classified");
            None
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn ocr_engine(_config: &Config) -> Option<Arc<dyn OcrEngine>> {
    warn!("Built without the `ocr` feature, image files will not be classified");
    None
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
