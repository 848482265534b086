//! # Value suppliers and chained transformations.
//!
//! [`Supplier`] is the no-input variant of a task: it produces a result from
//! nothing, wrapping a `Fn() -> O` closure. [`Chain`] goes the other way
//! around: it wraps a value and threads it through successive
//! transformations.

use super::task::Task;

/// A task that supplies a result without needing an input.
///
/// Also usable wherever a `Task<(), O>` is expected.
///
/// ## Example
/// ```rust
/// use groundwork::Supplier;
///
/// let answer = Supplier::new(|| 42);
/// assert_eq!(answer.get(), 42);
/// ```
pub struct Supplier<F> {
    f: F,
}

impl<F> Supplier<F> {
    /// Wraps the given producer closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<O, F> Supplier<F>
where
    F: Fn() -> O + Send + Sync,
{
    /// Produces and returns a value.
    pub fn get(&self) -> O {
        (self.f)()
    }
}

impl<O, F> Task<(), O> for Supplier<F>
where
    F: Fn() -> O + Send + Sync,
{
    fn execute(&self, _input: ()) -> O {
        self.get()
    }
}

/// A wrapped value with chainable transformations.
///
/// Each [`apply`](Chain::apply) consumes the chain and wraps the transformed
/// value in a new one, so complex transformations read as a linear sequence
/// of steps.
///
/// ## Example
/// ```rust
/// use groundwork::Chain;
///
/// let result = Chain::new(2)
///     .apply(|n| n * 10)
///     .apply(|n| format!("{n}!"))
///     .into_value();
/// assert_eq!(result, "20!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain<T> {
    value: T,
}

impl<T> Chain<T> {
    /// Wraps the given value.
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// Returns a reference to the wrapped value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Unwraps the chain, returning the value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Transforms the wrapped value, producing a new chain.
    #[must_use]
    pub fn apply<U>(self, transform: impl FnOnce(T) -> U) -> Chain<U> {
        Chain::new(transform(self.value))
    }

    /// Transforms the wrapped value through a [`Task`].
    #[must_use]
    pub fn apply_task<U, K>(self, task: &K) -> Chain<U>
    where
        K: Task<T, U> + ?Sized,
    {
        Chain::new(task.execute(self.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::task_fn;

    #[test]
    fn test_supplier_produces_value() {
        let supplier = Supplier::new(|| "ready");
        assert_eq!(supplier.get(), "ready");
    }

    #[test]
    fn test_supplier_is_a_task() {
        let supplier = Supplier::new(|| 7u8);
        assert_eq!(supplier.execute(()), 7);
    }

    #[test]
    fn test_chain_threads_value_through_transformations() {
        let chain = Chain::new(3).apply(|n| n + 1).apply(|n| n * n);
        assert_eq!(*chain.value(), 16);
    }

    #[test]
    fn test_chain_applies_task() {
        let negate = task_fn(|n: i32| -n);
        let chain = Chain::new(5).apply_task(&negate);
        assert_eq!(chain.into_value(), -5);
    }
}
