use once_cell::sync::OnceCell;
use rayon::ThreadPoolBuilder;
use std::sync::Arc;

static THREAD_POOL: OnceCell<Arc<rayon::ThreadPool>> = OnceCell::new();

/// Get the batch thread pool, creating it with `num_threads` workers on first use
///
/// The size requested by the first caller wins for the life of the process.
///
/// # Errors
///
/// Returns an error if the thread pool cannot be created
pub fn get_thread_pool(num_threads: usize) -> anyhow::Result<Arc<rayon::ThreadPool>> {
    THREAD_POOL
        .get_or_try_init(|| {
            let pool = ThreadPoolBuilder::new()
                .num_threads(num_threads.max(1))
                .thread_name(|i| format!("sumkeep-worker-{i}"))
                .build()?;
            Ok::<_, anyhow::Error>(Arc::new(pool))
        })
        .cloned()
}

/// Run a function inside the batch thread pool
///
/// # Errors
///
/// Returns an error if the thread pool cannot be created
pub fn run_in_pool<F, R>(num_threads: usize, f: F) -> anyhow::Result<R>
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    let pool = get_thread_pool(num_threads)?;
    Ok(pool.install(f))
}
