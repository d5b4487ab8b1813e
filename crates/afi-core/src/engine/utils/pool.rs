use crate::engine::error::EngineError;
use tracing::debug;

/// Runs `job` inside a dedicated pool of `max_workers` threads, or on the
/// ambient rayon pool when no limit is configured.
#[cfg(feature = "parallel")]
pub fn run_with_workers<T, F>(max_workers: Option<usize>, job: F) -> Result<T, EngineError>
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    match max_workers {
        Some(workers) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("afi-worker-{}", i))
                .build()
                .map_err(|e| EngineError::WorkerPool(e.to_string()))?;
            debug!(workers, "Running on a dedicated worker pool.");
            Ok(pool.install(job))
        }
        None => Ok(job()),
    }
}

#[cfg(not(feature = "parallel"))]
pub fn run_with_workers<T, F>(max_workers: Option<usize>, job: F) -> Result<T, EngineError>
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    if max_workers.is_some() {
        debug!("Parallel feature disabled; ignoring worker limit.");
    }
    Ok(job())
}
