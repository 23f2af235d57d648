//! Shared parallelism configuration.
//!
//! Every engine component receives a [`Parallelism`] hint and self-corrects
//! when parallel execution would be overkill for its workload. All work is
//! synchronous, CPU-bound and data-parallel; the partitioning unit is either
//! a column (quantile estimation, grid snapping) or a patient (expansion).

/// Parallelism strategy for engine operations.
///
/// This is a *hint*: components may downgrade to sequential execution when
/// the workload is too small to amortize thread coordination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    /// Strictly sequential execution (no thread spawning).
    Sequential,
    /// Parallel execution with up to `n` threads.
    Parallel(usize),
}

impl Default for Parallelism {
    fn default() -> Self {
        Self::Sequential
    }
}

impl Parallelism {
    /// Create a parallelism hint from a signed thread count.
    ///
    /// - `n <= 0` → auto-detect (rayon's current thread count)
    /// - `n == 1` → sequential
    /// - `n > 1` → parallel with `n` threads
    #[inline]
    pub fn from_hint(nthreads: i32) -> Self {
        match nthreads {
            n if n <= 0 => Self::Parallel(rayon::current_num_threads()),
            1 => Self::Sequential,
            n => Self::Parallel(n as usize),
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn allows_parallel(self) -> bool {
        matches!(self, Self::Parallel(n) if n > 1)
    }

    /// Downgrade to sequential if the workload cannot feed the threads.
    #[inline]
    pub fn correct_for_workload(self, n_items: usize, min_items_per_thread: usize) -> Self {
        match self {
            Self::Sequential => Self::Sequential,
            Self::Parallel(n) => {
                let effective = n.min(n_items / min_items_per_thread.max(1)).max(1);
                if effective <= 1 {
                    Self::Sequential
                } else {
                    Self::Parallel(effective)
                }
            }
        }
    }
}

/// Run `op` on the worker pool implied by a signed thread hint.
///
/// Uses the same hint mapping as [`Parallelism::from_hint`]:
/// - `n <= 0`: run in place; parallel stages inside `op` use the global pool
/// - `n == 1`: run in place; stages stay sequential via the hint
/// - `n > 1`: build a dedicated scoped pool of `n` threads and install `op`
///   on it, so the cap bounds the workers rather than merely enabling them
///
/// # Panics
///
/// Panics if `n > 1` and the thread pool cannot be created (rare OS-level
/// failure).
pub fn with_worker_pool<R: Send>(nthreads: i32, op: impl FnOnce() -> R + Send) -> R {
    if nthreads <= 1 {
        return op();
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(nthreads as usize)
        .build()
        .expect("Failed to create thread pool");
    pool.install(op)
}
