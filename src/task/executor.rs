//! # Concurrent fan-out of tasks over a shared input.
//!
//! [`ConcurrentExecutor`] runs the same input through several tasks at once
//! on a pool of worker threads and hands back one [`TaskHandle`] per task.
//!
//! ## Rules
//! - The task list is fixed at construction and must not be empty.
//! - In blocking mode (`wait_for_completion = true`, the default),
//!   [`execute`](ConcurrentExecutor::execute) returns only after every
//!   submitted task has finished. In non-blocking mode it returns
//!   immediately with in-flight handles.
//! - A failure inside one task (a panic) is captured on that task's handle;
//!   it is never raised from `execute` and does not affect sibling tasks.
//! - [`dispose`](Disposable::dispose) shuts the pool down exactly once.
//!   Every guarded operation afterwards fails with a disposed error.
//!
//! ## Example
//! ```rust
//! use groundwork::{task_fn, ConcurrentExecutor};
//!
//! let executor = ConcurrentExecutor::builder()
//!     .with_task(task_fn(|n: u64| n + 1))
//!     .with_task(task_fn(|n: u64| n * 2))
//!     .build()
//!     .unwrap();
//!
//! let handles = executor.execute(10).unwrap();
//! let mut results: Vec<u64> = handles
//!     .into_iter()
//!     .map(|h| h.join().unwrap())
//!     .collect();
//! results.sort_unstable();
//! assert_eq!(results, vec![11, 20]);
//! ```

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};
use tokio::sync::oneshot;

use crate::check::{ensure_predicate, ArgumentError};
use crate::disposable::{not_disposed, Disposable, ResourceDisposedError};

use super::task::{Task, TaskRef};

const RESOURCE: &str = "ConcurrentExecutor";

/// Failure of one submitted task, reported on its [`TaskHandle`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The task panicked while running.
    #[error("task panicked: {reason}")]
    Panicked {
        /// The panic payload, rendered as text.
        reason: String,
    },

    /// The pool shut down before the task could run to completion.
    #[error("task canceled before completion")]
    Canceled,
}

/// Failure to assemble a [`ConcurrentExecutor`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ExecutorBuildError {
    /// The builder was misused (e.g. no tasks were supplied).
    #[error(transparent)]
    InvalidArgument(#[from] ArgumentError),

    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] std::io::Error),
}

/// Handle to one submitted task.
///
/// The handle owns the task's result slot: inspect it with
/// [`join`](TaskHandle::join) (blocking) or [`try_join`](TaskHandle::try_join)
/// (polling). Dropping the handle discards the result.
#[derive(Debug)]
pub struct TaskHandle<O> {
    rx: oneshot::Receiver<Result<O, ExecuteError>>,
}

impl<O> TaskHandle<O> {
    /// Blocks until the task finishes and returns its outcome.
    ///
    /// Reports [`ExecuteError::Canceled`] when the pool shut down before the
    /// task produced a result.
    pub fn join(self) -> Result<O, ExecuteError> {
        match self.rx.blocking_recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(ExecuteError::Canceled),
        }
    }

    /// Returns the outcome if the task has already finished, `None` while it
    /// is still running.
    ///
    /// A ready outcome is consumed by this call; a later
    /// [`join`](TaskHandle::join) on the same handle reports
    /// [`ExecuteError::Canceled`].
    pub fn try_join(&mut self) -> Option<Result<O, ExecuteError>> {
        use oneshot::error::TryRecvError;
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(ExecuteError::Canceled)),
        }
    }
}

/// Builder for [`ConcurrentExecutor`].
pub struct ExecutorBuilder<I, O> {
    tasks: Vec<TaskRef<I, O>>,
    wait_for_completion: bool,
    runtime: Option<Runtime>,
}

impl<I, O> Default for ExecutorBuilder<I, O>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, O> ExecutorBuilder<I, O>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
{
    /// Creates a builder with no tasks, blocking mode, and a default pool.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            wait_for_completion: true,
            runtime: None,
        }
    }

    /// Adds a task to execute.
    #[must_use]
    pub fn with_task(mut self, task: impl Task<I, O> + 'static) -> Self {
        self.tasks.push(Arc::new(task));
        self
    }

    /// Adds already-shared tasks to execute.
    #[must_use]
    pub fn with_tasks(mut self, tasks: impl IntoIterator<Item = TaskRef<I, O>>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    /// Sets whether [`ConcurrentExecutor::execute`] blocks until all
    /// submitted tasks finish. Defaults to `true`.
    #[must_use]
    pub fn with_wait_for_completion(mut self, wait: bool) -> Self {
        self.wait_for_completion = wait;
        self
    }

    /// Supplies a caller-owned worker pool instead of the default one.
    ///
    /// Use this to share a tuned pool between executors or to control worker
    /// thread counts.
    #[must_use]
    pub fn with_runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Assembles the executor.
    ///
    /// Fails when no tasks were supplied or the worker pool cannot start.
    pub fn build(self) -> Result<ConcurrentExecutor<I, O>, ExecutorBuildError> {
        ensure_predicate(!self.tasks.is_empty(), "'tasks' MUST not be empty.")?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => RuntimeBuilder::new_multi_thread()
                .thread_name("groundwork-worker")
                .build()?,
        };
        Ok(ConcurrentExecutor {
            tasks: self.tasks,
            wait_for_completion: self.wait_for_completion,
            runtime: Mutex::new(Some(runtime)),
            disposed: AtomicBool::new(false),
        })
    }
}

/// Runs a fixed set of tasks concurrently against one shared input.
///
/// Owns the worker pool for the lifetime of the executor; release it with
/// [`dispose`](Disposable::dispose) or by dropping the executor.
pub struct ConcurrentExecutor<I, O> {
    tasks: Vec<TaskRef<I, O>>,
    wait_for_completion: bool,
    runtime: Mutex<Option<Runtime>>,
    disposed: AtomicBool,
}

impl<I, O> ConcurrentExecutor<I, O>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
{
    /// Returns a builder for assembling an executor.
    pub fn builder() -> ExecutorBuilder<I, O> {
        ExecutorBuilder::new()
    }

    /// Submits every task with a clone of `input` and returns their handles.
    ///
    /// In blocking mode this returns once all tasks have finished (their
    /// outcomes are then immediately available on the handles); in
    /// non-blocking mode it returns while tasks may still be running.
    ///
    /// Fails with a disposed error once the executor has been released.
    pub fn execute(&self, input: I) -> Result<Vec<TaskHandle<O>>, ResourceDisposedError> {
        not_disposed(self, RESOURCE)?;

        let guard = self.runtime.lock();
        let runtime = match guard.as_ref() {
            Some(runtime) => runtime,
            None => return Err(ResourceDisposedError::new(RESOURCE)),
        };

        let mut handles = Vec::with_capacity(self.tasks.len());
        let mut submissions = Vec::with_capacity(self.tasks.len());
        for task in &self.tasks {
            let task = Arc::clone(task);
            let input = input.clone();
            let (tx, rx) = oneshot::channel();
            submissions.push(runtime.spawn_blocking(move || {
                let outcome =
                    catch_unwind(AssertUnwindSafe(|| task.execute(input))).map_err(|panic| {
                        let reason = panic_reason(panic.as_ref());
                        log::error!("task panicked during concurrent execution: {reason}");
                        ExecuteError::Panicked { reason }
                    });
                // The receiver may already be gone; the outcome is then dropped.
                let _ = tx.send(outcome);
            }));
            handles.push(TaskHandle { rx });
        }

        if self.wait_for_completion {
            let _ = runtime.block_on(futures::future::join_all(submissions));
        }
        Ok(handles)
    }
}

impl<I, O> ConcurrentExecutor<I, O> {
    /// Returns the tasks this executor runs, in submission order.
    pub fn tasks(&self) -> &[TaskRef<I, O>] {
        &self.tasks
    }

    /// Returns whether [`execute`](ConcurrentExecutor::execute) blocks until
    /// all submissions finish.
    pub fn wait_for_completion(&self) -> bool {
        self.wait_for_completion
    }
}

impl<I, O> Disposable for ConcurrentExecutor<I, O> {
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Shuts down the worker pool. Only the first call has an effect.
    ///
    /// With `wait_for_completion` enabled, shutdown drains in-flight work
    /// before returning; otherwise outstanding tasks may be abandoned and
    /// their handles report [`ExecuteError::Canceled`].
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(runtime) = self.runtime.lock().take() {
            if self.wait_for_completion {
                drop(runtime);
            } else {
                runtime.shutdown_background();
            }
        }
    }
}

impl<I, O> Drop for ConcurrentExecutor<I, O> {
    fn drop(&mut self) {
        if !self.is_disposed() {
            if !self.wait_for_completion {
                log::warn!(
                    "dropping a ConcurrentExecutor with wait_for_completion disabled; \
                     in-flight tasks may be canceled"
                );
            }
            self.dispose();
        }
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_owned()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "opaque panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::task_fn;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::time::Duration;

    fn counting_executor(
        counter: &Arc<AtomicUsize>,
        n: usize,
        wait: bool,
    ) -> ConcurrentExecutor<u32, u32> {
        let mut builder = ConcurrentExecutor::builder().with_wait_for_completion(wait);
        for _ in 0..n {
            let counter = Arc::clone(counter);
            builder = builder.with_task(task_fn(move |input: u32| {
                std::thread::sleep(Duration::from_millis(10));
                counter.fetch_add(1, Ordering::SeqCst);
                input
            }));
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_build_rejects_empty_task_list() {
        let result = ConcurrentExecutor::<u32, u32>::builder().build();
        assert!(matches!(
            result,
            Err(ExecutorBuildError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_blocking_execute_waits_for_all_tasks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let executor = counting_executor(&counter, 4, true);

        let handles = executor.execute(0).unwrap();
        assert_eq!(
            counter.load(Ordering::SeqCst),
            4,
            "all tasks must have finished before execute returned"
        );
        assert_eq!(handles.len(), 4);
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_non_blocking_execute_returns_with_work_in_flight() {
        let barrier = Arc::new(Barrier::new(3));
        let mut builder = ConcurrentExecutor::builder().with_wait_for_completion(false);
        for _ in 0..2 {
            let barrier = Arc::clone(&barrier);
            builder = builder.with_task(task_fn(move |input: u32| {
                barrier.wait();
                input + 1
            }));
        }
        let executor = builder.build().unwrap();

        let mut handles = executor.execute(1).unwrap();
        for handle in &mut handles {
            assert!(
                handle.try_join().is_none(),
                "tasks are gated on the barrier and cannot be done yet"
            );
        }

        // Release the tasks and collect their results.
        barrier.wait();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }

        executor.dispose();
    }

    #[test]
    fn test_task_panic_is_captured_on_its_handle() {
        let executor = ConcurrentExecutor::builder()
            .with_task(task_fn(|_: u32| -> u32 { panic!("boom") }))
            .with_task(task_fn(|n: u32| n + 6))
            .build()
            .unwrap();

        let handles = executor.execute(1).unwrap();
        let outcomes: Vec<Result<u32, ExecuteError>> =
            handles.into_iter().map(TaskHandle::join).collect();

        let panicked = outcomes
            .iter()
            .filter(|o| matches!(o, Err(ExecuteError::Panicked { .. })))
            .count();
        let succeeded = outcomes.iter().filter(|o| matches!(o, Ok(7))).count();
        assert_eq!(panicked, 1, "exactly one task panicked");
        assert_eq!(succeeded, 1, "the sibling task must still succeed");
    }

    #[test]
    fn test_dispose_is_idempotent_and_guards_execute() {
        let executor = ConcurrentExecutor::builder()
            .with_task(task_fn(|n: u32| n))
            .build()
            .unwrap();

        executor.dispose();
        executor.dispose();
        assert!(executor.is_disposed());

        let err = executor.execute(3).unwrap_err();
        assert_eq!(err.resource(), "ConcurrentExecutor");
    }

    #[test]
    fn test_scoped_executor_disposes_on_scope_exit() {
        use crate::disposable::Scoped;

        let executor = Arc::new(
            ConcurrentExecutor::builder()
                .with_task(task_fn(|n: u32| n))
                .build()
                .unwrap(),
        );
        {
            let scoped = Scoped::new(Arc::clone(&executor));
            scoped.execute(1).unwrap();
        }
        assert!(executor.is_disposed());
    }

    #[test]
    fn test_caller_supplied_runtime_is_used() {
        let runtime = RuntimeBuilder::new_multi_thread().build().unwrap();
        let executor = ConcurrentExecutor::builder()
            .with_task(task_fn(|n: u32| n * n))
            .with_runtime(runtime)
            .build()
            .unwrap();

        let handles = executor.execute(9).unwrap();
        let results: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec![81]);
    }
}
