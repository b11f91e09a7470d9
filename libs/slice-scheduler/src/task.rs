//! # Task Graph
//!
//! Completion latches with continuations, and an executor that starts a job
//! on the rayon pool once its dependency has finished. Workers never block on
//! another job; only callers of [`JobHandle::wait`] do.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::error::SliceResult;

type Continuation = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct LatchState {
    finished: bool,
    continuations: Vec<Continuation>,
}

#[derive(Default)]
struct Latch {
    state: Mutex<LatchState>,
    done: Condvar,
}

impl Latch {
    fn finish(&self) {
        let continuations = {
            let mut state = self.state.lock();
            state.finished = true;
            std::mem::take(&mut state.continuations)
        };
        self.done.notify_all();
        for continuation in continuations {
            continuation();
        }
    }
}

/// Handle to a scheduled job.
///
/// Cloning shares the same latch. The default handle is already completed.
#[derive(Clone, Default)]
pub struct JobHandle(Option<Arc<Latch>>);

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl JobHandle {
    /// A handle that is already completed.
    pub fn completed() -> Self {
        Self(None)
    }

    fn pending() -> (Self, Arc<Latch>) {
        let latch = Arc::new(Latch::default());
        (Self(Some(Arc::clone(&latch))), latch)
    }

    /// True once the job has finished. Never blocks.
    pub fn is_completed(&self) -> bool {
        match &self.0 {
            None => true,
            Some(latch) => latch.state.lock().finished,
        }
    }

    /// Blocks until the job has finished.
    pub fn wait(&self) {
        if let Some(latch) = &self.0 {
            let mut state = latch.state.lock();
            while !state.finished {
                latch.done.wait(&mut state);
            }
        }
    }

    /// Runs `f` once the job has finished, inline if it already has.
    pub fn on_complete(&self, f: impl FnOnce() + Send + 'static) {
        if let Some(latch) = &self.0 {
            let mut state = latch.state.lock();
            if !state.finished {
                state.continuations.push(Box::new(f));
                return;
            }
        }
        f();
    }

    /// A handle that completes once every handle in `handles` has.
    pub fn combine(handles: &[JobHandle]) -> JobHandle {
        let pending: Vec<&JobHandle> = handles.iter().filter(|h| !h.is_completed()).collect();
        if pending.is_empty() {
            return JobHandle::completed();
        }
        let (combined, latch) = JobHandle::pending();
        let remaining = Arc::new(AtomicUsize::new(pending.len()));
        for handle in pending {
            let latch = Arc::clone(&latch);
            let remaining = Arc::clone(&remaining);
            handle.on_complete(move || {
                if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                    latch.finish();
                }
            });
        }
        combined
    }
}

/// Runs jobs on a dedicated rayon pool.
#[derive(Clone)]
pub struct Executor {
    pool: Arc<rayon::ThreadPool>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl Executor {
    /// Creates an executor with `threads` workers.
    pub fn new(threads: usize) -> SliceResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("slice-worker-{i}"))
            .build()?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Schedules `job` to run after `dependency` finishes.
    ///
    /// A panicking job is logged and still completes its handle.
    pub fn schedule<F>(&self, dependency: &JobHandle, job: F) -> JobHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let (handle, latch) = JobHandle::pending();
        let pool = Arc::clone(&self.pool);
        dependency.on_complete(move || {
            pool.spawn(move || {
                if let Err(panic) = catch_unwind(AssertUnwindSafe(job)) {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    log::error!("slice job panicked: {message}");
                }
                latch.finish();
            });
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::mpsc;
    use std::time::Duration;

    fn executor() -> Executor {
        Executor::new(2).unwrap()
    }

    #[test]
    fn test_completed_handle() {
        let handle = JobHandle::completed();
        assert!(handle.is_completed());
        handle.wait();
    }

    #[test]
    fn test_schedule_runs_job() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let handle = executor().schedule(&JobHandle::completed(), move || {
            flag.store(true, Ordering::SeqCst);
        });
        handle.wait();
        assert!(handle.is_completed());
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_dependency_orders_jobs() {
        let executor = executor();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = Arc::clone(&order);
        let first = executor.schedule(&JobHandle::completed(), move || {
            let _ = gate_rx.recv_timeout(Duration::from_secs(5));
            o.lock().push(1);
        });
        let o = Arc::clone(&order);
        let second = executor.schedule(&first, move || o.lock().push(2));

        assert!(!second.is_completed());
        gate_tx.send(()).unwrap();
        second.wait();
        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[test]
    fn test_combine_waits_for_all() {
        let executor = executor();
        let (tx, rx) = mpsc::channel::<()>();
        let blocked = executor.schedule(&JobHandle::completed(), move || {
            let _ = rx.recv_timeout(Duration::from_secs(5));
        });
        let quick = executor.schedule(&JobHandle::completed(), || {});
        quick.wait();

        let combined = JobHandle::combine(&[quick, blocked.clone()]);
        assert!(!combined.is_completed());
        tx.send(()).unwrap();
        combined.wait();
        assert!(blocked.is_completed());
    }

    #[test]
    fn test_combine_of_completed_is_completed() {
        assert!(JobHandle::combine(&[]).is_completed());
        assert!(JobHandle::combine(&[JobHandle::completed()]).is_completed());
    }

    #[test]
    fn test_panicking_job_still_completes() {
        let handle = executor().schedule(&JobHandle::completed(), || panic!("boom"));
        handle.wait();
        assert!(handle.is_completed());
    }

    #[test]
    fn test_on_complete_runs_inline_when_done() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        JobHandle::completed().on_complete(move || flag.store(true, Ordering::SeqCst));
        assert!(ran.load(Ordering::SeqCst));
    }
}
