//! Helpers for feeding and driving settle futures

pub mod block_on;
pub mod coroutine;
pub mod iterable;
pub mod step_fn;

pub use block_on::{BlockError, block_on, block_on_with};
pub use coroutine::{Await, Coroutine, Resume, Step};
pub use iterable::{Generate, Walk, generate, walk, walk_while};
pub use step_fn::{StepFn, step_fn};

// Ensures the coroutines we return implement the trait for the types the
// caller expects.
pub(crate) fn assert_coroutine<T, E, O, C>(coroutine: C) -> C
where
    C: Coroutine<T, E, Output = O>,
{
    coroutine
}
