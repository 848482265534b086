//! # Task trait and structural combinators.
//!
//! [`Task`] describes a single-input, single-result unit of work. Combinators
//! build new tasks out of existing ones without executing anything at
//! composition time:
//!
//! - [`Task::and_then`]: run `self`, feed its output to the next task.
//! - [`Task::compose`]: run another task first, feed its output to `self`.
//! - [`TaskFn`] / [`task_fn`]: wrap a plain closure as a task.
//!
//! The common shared handle is [`TaskRef`], an `Arc<dyn Task>`.
//!
//! ## Example
//! ```rust
//! use groundwork::{task_fn, Task};
//!
//! let double = task_fn(|n: u32| n * 2);
//! let describe = task_fn(|n: u32| format!("got {n}"));
//!
//! let pipeline = double.and_then(describe);
//! assert_eq!(pipeline.execute(21), "got 42");
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

/// A job or action to perform: consumes an input, produces a result.
///
/// Implementations must be shareable across threads; the trait is object safe
/// and usually handled through [`TaskRef`].
pub trait Task<I, O>: Send + Sync {
    /// Performs the computation.
    fn execute(&self, input: I) -> O;

    /// Chains another task after this one.
    ///
    /// The returned task feeds this task's output into `after`. Nothing runs
    /// until the combined task itself is executed.
    fn and_then<U, A>(self, after: A) -> AndThen<Self, A, O>
    where
        Self: Sized,
        A: Task<O, U>,
    {
        AndThen {
            first: self,
            second: after,
            _mid: PhantomData,
        }
    }

    /// Composes another task before this one.
    ///
    /// The returned task feeds `before`'s output into this task. Nothing runs
    /// until the combined task itself is executed.
    fn compose<P, B>(self, before: B) -> Compose<Self, B, I>
    where
        Self: Sized,
        B: Task<P, I>,
    {
        Compose {
            task: self,
            before,
            _mid: PhantomData,
        }
    }
}

/// Shared handle to a task (`Arc<dyn Task>`).
pub type TaskRef<I, O> = Arc<dyn Task<I, O>>;

impl<I, O, T: Task<I, O> + ?Sized> Task<I, O> for Arc<T> {
    fn execute(&self, input: I) -> O {
        (**self).execute(input)
    }
}

impl<I, O, T: Task<I, O> + ?Sized> Task<I, O> for Box<T> {
    fn execute(&self, input: I) -> O {
        (**self).execute(input)
    }
}

/// Sequential combination of two tasks, first then second.
///
/// Created by [`Task::and_then`].
pub struct AndThen<A, B, M> {
    first: A,
    second: B,
    _mid: PhantomData<fn() -> M>,
}

impl<I, M, O, A, B> Task<I, O> for AndThen<A, B, M>
where
    A: Task<I, M>,
    B: Task<M, O>,
{
    fn execute(&self, input: I) -> O {
        self.second.execute(self.first.execute(input))
    }
}

/// Sequential combination of two tasks, the second operand running first.
///
/// Created by [`Task::compose`].
pub struct Compose<A, B, M> {
    task: A,
    before: B,
    _mid: PhantomData<fn() -> M>,
}

impl<I, M, O, A, B> Task<I, O> for Compose<A, B, M>
where
    B: Task<I, M>,
    A: Task<M, O>,
{
    fn execute(&self, input: I) -> O {
        self.task.execute(self.before.execute(input))
    }
}

/// Closure-backed task implementation.
///
/// Wraps any `Fn(I) -> O` closure or function pointer. Prefer the
/// [`task_fn`] shorthand.
pub struct TaskFn<F> {
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new closure-backed task.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<I, O, F> Task<I, O> for TaskFn<F>
where
    F: Fn(I) -> O + Send + Sync,
{
    fn execute(&self, input: I) -> O {
        (self.f)(input)
    }
}

/// Wraps a closure as a [`Task`].
///
/// ## Example
/// ```rust
/// use groundwork::{task_fn, Task};
///
/// let parse = task_fn(|raw: &str| raw.trim().to_owned());
/// assert_eq!(parse.execute("  hi "), "hi");
/// ```
pub fn task_fn<F>(f: F) -> TaskFn<F> {
    TaskFn::new(f)
}

/// Returns a task that yields its input unchanged.
pub fn identity<T>() -> TaskFn<fn(T) -> T> {
    TaskFn::new(std::convert::identity)
}
