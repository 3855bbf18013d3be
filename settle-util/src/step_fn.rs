use core::fmt;

use crate::{
    assert_coroutine,
    coroutine::{Coroutine, Resume, Step},
};

/// Coroutine for the [`step_fn`] function.
#[must_use = "coroutines do nothing unless driven"]
pub struct StepFn<F> {
    f: F,
}

/// Creates a coroutine from a closure called once per resumption.
///
/// State the computation carries between steps lives in the closure's
/// captures.
pub fn step_fn<T, E, O, F>(f: F) -> StepFn<F>
where
    F: FnMut(Resume<T, E>) -> Result<Step<T, E, O>, E>,
{
    assert_coroutine::<T, E, O, _>(StepFn { f })
}

impl<F> fmt::Debug for StepFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepFn").finish()
    }
}

impl<T, E, O, F> Coroutine<T, E> for StepFn<F>
where
    F: FnMut(Resume<T, E>) -> Result<Step<T, E, O>, E>,
{
    type Output = O;

    fn resume(&mut self, input: Resume<T, E>) -> Result<Step<T, E, O>, E> {
        (self.f)(input)
    }
}
