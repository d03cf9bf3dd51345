use crossbeam_utils::thread;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Starts workers for island dispatch and reports how many are available.
///
/// Dispatchers only need to jumpstart threads. Callers balance load themselves by pulling job indices
/// from a [`JobCounter`], so wrapping an existing thread pool is enough.
pub trait IThreadDispatcher: Sync {
    /// Gets the number of workers available in the thread dispatcher.
    fn thread_count(&self) -> usize;

    /// Dispatches `worker_body` on up to `maximum_worker_count` workers and returns once all of them have finished.
    ///
    /// # Arguments
    ///
    /// * `worker_body` - Function invoked on every worker with the worker's index.
    /// * `maximum_worker_count` - Maximum number of workers to dispatch.
    fn dispatch_workers(&self, worker_body: &(dyn Fn(usize) + Sync), maximum_worker_count: usize);
}

/// Runs every dispatch inline on the calling thread as worker 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialThreadDispatcher;

impl IThreadDispatcher for SequentialThreadDispatcher {
    fn thread_count(&self) -> usize {
        1
    }

    fn dispatch_workers(&self, worker_body: &(dyn Fn(usize) + Sync), maximum_worker_count: usize) {
        if maximum_worker_count > 0 {
            worker_body(0);
        }
    }
}

/// Spawns scoped threads for each dispatch. The calling thread acts as worker 0.
#[derive(Debug, Clone, Copy)]
pub struct ScopedThreadDispatcher {
    thread_count: usize,
}

impl ScopedThreadDispatcher {
    /// Creates a dispatcher with the given number of workers. A count of zero is treated as one.
    pub fn new(thread_count: usize) -> Self {
        Self {
            thread_count: thread_count.max(1),
        }
    }
}

impl IThreadDispatcher for ScopedThreadDispatcher {
    fn thread_count(&self) -> usize {
        self.thread_count
    }

    fn dispatch_workers(&self, worker_body: &(dyn Fn(usize) + Sync), maximum_worker_count: usize) {
        let worker_count = self.thread_count.min(maximum_worker_count);
        if worker_count == 0 {
            return;
        }
        if worker_count == 1 {
            worker_body(0);
            return;
        }
        let scope_result = thread::scope(|scope| {
            for worker_index in 1..worker_count {
                scope.spawn(move |_| worker_body(worker_index));
            }
            worker_body(0);
        });
        if let Err(panic) = scope_result {
            std::panic::resume_unwind(panic);
        }
    }
}

/// Hands out job indices in `0..job_count` to whichever worker asks first.
#[derive(Debug)]
pub struct JobCounter {
    next: AtomicUsize,
    job_count: usize,
}

impl JobCounter {
    /// Creates a counter over `job_count` jobs.
    pub fn new(job_count: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            job_count,
        }
    }

    /// Claims the next job, or `None` once every job has been claimed.
    #[inline(always)]
    pub fn claim(&self) -> Option<usize> {
        let job = self.next.fetch_add(1, Ordering::Relaxed);
        (job < self.job_count).then_some(job)
    }
}
