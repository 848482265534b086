//! # Sequential task pipeline.
//!
//! [`Pipe`] applies a fixed, ordered sequence of tasks to its input from left
//! to right; each task consumes the previous task's output. The sequence is
//! fixed at construction and must not be empty.

use crate::check::{ensure_predicate, ArgumentError};

use super::task::{Task, TaskRef};

/// A task that pipes its input through an ordered sequence of tasks.
///
/// ## Example
/// ```rust
/// use groundwork::{task_fn, Pipe, Task};
///
/// let pipe = Pipe::of(task_fn(|n: i64| n + 1))
///     .then(task_fn(|n: i64| n * 10));
///
/// assert_eq!(pipe.execute(4), 50);
/// ```
pub struct Pipe<T> {
    tasks: Vec<TaskRef<T, T>>,
}

impl<T: 'static> Pipe<T> {
    /// Creates a pipe from an existing sequence of tasks.
    ///
    /// Fails when `tasks` is empty; a pipe with nothing to apply has no
    /// meaningful output.
    pub fn new(tasks: Vec<TaskRef<T, T>>) -> Result<Self, ArgumentError> {
        ensure_predicate(!tasks.is_empty(), "'tasks' MUST not be empty.")?;
        Ok(Self { tasks })
    }

    /// Creates a pipe holding a single stage.
    pub fn of(task: impl Task<T, T> + 'static) -> Self {
        Self {
            tasks: vec![std::sync::Arc::new(task)],
        }
    }

    /// Appends another stage to the end of the pipe.
    #[must_use]
    pub fn then(mut self, task: impl Task<T, T> + 'static) -> Self {
        self.tasks.push(std::sync::Arc::new(task));
        self
    }

    /// Returns the stages that comprise this pipe, in application order.
    pub fn tasks(&self) -> &[TaskRef<T, T>] {
        &self.tasks
    }
}

impl<T: 'static> Task<T, T> for Pipe<T> {
    fn execute(&self, input: T) -> T {
        self.tasks
            .iter()
            .fold(input, |acc, task| task.execute(acc))
    }
}
