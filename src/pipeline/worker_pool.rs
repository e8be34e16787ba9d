use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinError;

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("Worker pool is shut down")]
    Closed,

    #[error("Worker panicked: {0}")]
    Panicked(String),

    #[error("Worker was cancelled")]
    Cancelled,
}

impl From<JoinError> for PoolError {
    fn from(err: JoinError) -> Self {
        if err.is_cancelled() {
            return PoolError::Cancelled;
        }
        PoolError::Panicked(panic_message(err.into_panic()))
    }
}

pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Fixed-size pool bounding how many extraction/classification stages run
/// at once. Callers beyond the limit queue on the semaphore.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run a blocking job on tokio's blocking threads while holding a permit.
    /// A panic in the job comes back as [`PoolError::Panicked`].
    pub async fn run_blocking<F, T>(&self, job: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;
        Ok(tokio::task::spawn_blocking(job).await?)
    }

    /// Await a future while holding a permit.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, PoolError>
    where
        F: Future,
    {
        let _permit = self.permits.acquire().await.map_err(|_| PoolError::Closed)?;
        Ok(fut.await)
    }

    /// Stop handing out permits. Stages already running finish normally.
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}
