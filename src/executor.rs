// src/executor.rs
//! Bounded-Concurrency Task Executor
//!
//! # Model
//!
//! [`TaskExecutor::scope`] starts a fixed pool of worker threads and hands
//! the caller an [`ExecutorScope`]. Work submitted through the scope goes on
//! a queue guarded by a mutex; idle workers are woken through a condition
//! variable and drain the queue until the scope closes. Queued work is taken
//! last-in first-out: callers must not rely on execution order.
//!
//! [`ExecutorScope::join_all`] blocks until every task submitted so far has
//! finished. A task that panics still counts as finished; the panic is
//! reported by `join_all` instead of tearing down the pool.
//!
//! Tasks may borrow anything that outlives the call to `scope`, which is how
//! pricing tasks share the contract and model without reference counting.
//!
//! # Example
//!
//! ```rust
//! use parallel_mc::executor::TaskExecutor;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let counter = AtomicUsize::new(0);
//! let stats = TaskExecutor::new(4).scope(|exec| {
//!     for _ in 0..100 {
//!         exec.submit(|| {
//!             counter.fetch_add(1, Ordering::Relaxed);
//!         });
//!     }
//!     exec.join_all()
//! });
//! assert_eq!(stats.unwrap().completed, 100);
//! assert_eq!(counter.load(Ordering::Relaxed), 100);
//! ```

use crate::error::{PricingError, PricingResult};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use tracing::{debug, trace, warn};

type Job<'env> = Box<dyn FnOnce() + Send + 'env>;

/// Counters observed by a successful [`ExecutorScope::join_all`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    pub submitted: usize,
    pub completed: usize,
}

struct State<'env> {
    queue: Vec<Job<'env>>,
    running: usize,
    submitted: usize,
    completed: usize,
    panicked: usize,
    closed: bool,
}

impl<'env> State<'env> {
    fn idle(&self) -> bool {
        self.queue.is_empty() && self.running == 0
    }
}

struct Shared<'env> {
    state: Mutex<State<'env>>,
    work_available: Condvar,
    all_done: Condvar,
}

impl<'env> Shared<'env> {
    fn new() -> Self {
        Shared {
            state: Mutex::new(State {
                queue: Vec::new(),
                running: 0,
                submitted: 0,
                completed: 0,
                panicked: 0,
                closed: false,
            }),
            work_available: Condvar::new(),
            all_done: Condvar::new(),
        }
    }

    // No lock is held while a task runs, so a poisoned mutex still guards
    // consistent counters.
    fn lock(&self) -> MutexGuard<'_, State<'env>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close(&self) {
        self.lock().closed = true;
        self.work_available.notify_all();
    }

    fn next_job(&self) -> Option<Job<'env>> {
        let mut state = self.lock();
        loop {
            if let Some(job) = state.queue.pop() {
                state.running += 1;
                return Some(job);
            }
            if state.closed {
                return None;
            }
            state = self
                .work_available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn finish_job(&self, panicked: bool) {
        let mut state = self.lock();
        state.running -= 1;
        state.completed += 1;
        if panicked {
            state.panicked += 1;
        }
        if state.idle() {
            self.all_done.notify_all();
        }
    }

    fn worker_loop(&self, worker: usize) {
        trace!(worker, "worker started");
        let mut executed = 0usize;
        while let Some(job) = self.next_job() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(job));
            if outcome.is_err() {
                warn!(worker, "task panicked");
            }
            self.finish_job(outcome.is_err());
            executed += 1;
        }
        trace!(worker, executed, "worker retired");
    }
}

/// Closes the pool even if the caller's closure unwinds, so the workers
/// exit and the surrounding thread scope can join them.
struct CloseOnDrop<'a, 'env>(&'a Shared<'env>);

impl Drop for CloseOnDrop<'_, '_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Handle for submitting work to a running pool
pub struct ExecutorScope<'a, 'env> {
    shared: &'a Shared<'env>,
    workers: usize,
}

impl<'a, 'env> ExecutorScope<'a, 'env> {
    /// Queue a task; an idle worker picks it up immediately
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'env,
    {
        let mut state = self.shared.lock();
        state.queue.push(Box::new(task));
        state.submitted += 1;
        drop(state);
        self.shared.work_available.notify_one();
    }

    /// Number of worker threads in the pool
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Block until all submitted tasks have completed.
    ///
    /// Fails with [`PricingError::TaskFailed`] if any task panicked since
    /// the previous call.
    pub fn join_all(&self) -> PricingResult<ExecutorStats> {
        let mut state = self.shared.lock();
        while !state.idle() {
            state = self
                .shared
                .all_done
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let stats = ExecutorStats {
            submitted: state.submitted,
            completed: state.completed,
        };
        let panicked = std::mem::take(&mut state.panicked);
        if panicked > 0 {
            return Err(PricingError::TaskFailed {
                reason: format!("{} of {} tasks panicked", panicked, stats.submitted),
            });
        }
        Ok(stats)
    }
}

/// Scheduler running at most `max_workers` tasks at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskExecutor {
    max_workers: usize,
}

impl TaskExecutor {
    pub fn new(max_workers: usize) -> Self {
        TaskExecutor {
            max_workers: max_workers.max(1),
        }
    }

    /// One worker per logical CPU
    pub fn with_default_concurrency() -> Self {
        Self::new(num_cpus::get())
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run `f` with a live worker pool.
    ///
    /// Remaining queued work is completed before `scope` returns, whether or
    /// not `f` called [`ExecutorScope::join_all`].
    pub fn scope<'env, F, T>(&self, f: F) -> T
    where
        F: FnOnce(&ExecutorScope<'_, 'env>) -> T,
    {
        let shared = Shared::new();
        debug!(workers = self.max_workers, "starting executor");
        thread::scope(|s| {
            for worker in 0..self.max_workers {
                let shared = &shared;
                s.spawn(move || shared.worker_loop(worker));
            }
            let _close = CloseOnDrop(&shared);
            let exec = ExecutorScope {
                shared: &shared,
                workers: self.max_workers,
            };
            // Workers drain the queue before noticing the pool is closed.
            f(&exec)
        })
    }
}

impl Default for TaskExecutor {
    fn default() -> Self {
        Self::with_default_concurrency()
    }
}
