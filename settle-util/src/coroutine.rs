//! Resumable computations that suspend on futures.
//!
//! A [`Coroutine`] is resumed with the outcome of whatever it last awaited
//! and answers with the next [`Step`]: either another thing to await or its
//! final result. `settle_combinators::flow` drives one to completion.

use settle_core::{IntoResolution, Payload, Resolution};

/// Input handed to [`Coroutine::resume`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resume<T, E> {
    /// First resumption; nothing has been awaited yet.
    Start,
    /// The awaited value. A single await yields a scalar, an
    /// [`Await::All`] yields a sequence in input order.
    Next(Payload<T>),
    /// The awaited future rejected.
    Throw(E),
}

/// Something a coroutine suspends on.
#[derive(Debug)]
pub enum Await<T, E> {
    One(Resolution<T, E>),
    All(Vec<Resolution<T, E>>),
}

impl<T, E> Await<T, E> {
    pub fn one(item: impl IntoResolution<T, E>) -> Self {
        Await::One(item.into_resolution())
    }

    pub fn all<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoResolution<T, E>,
    {
        Await::All(items.into_iter().map(|item| item.into_resolution()).collect())
    }
}

/// What a coroutine does next.
#[derive(Debug)]
pub enum Step<T, E, O> {
    Await(Await<T, E>),
    Complete(Resolution<O, E>),
}

impl<T, E, O> Step<T, E, O> {
    pub fn await_one(item: impl IntoResolution<T, E>) -> Self {
        Step::Await(Await::one(item))
    }

    pub fn await_all<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoResolution<T, E>,
    {
        Step::Await(Await::all(items))
    }

    pub fn complete(result: impl IntoResolution<O, E>) -> Self {
        Step::Complete(result.into_resolution())
    }
}

/// A computation that can be suspended and resumed.
///
/// `T` is the type of values it awaits, `E` the shared failure type. The
/// driver calls `resume` with [`Resume::Start`] first and then once per
/// awaited step. Returning `Err` ends the computation with that failure;
/// so does returning `Step::Complete` with an error resolution.
///
/// A coroutine is not resumed again after it completes or fails.
pub trait Coroutine<T, E> {
    type Output;

    fn resume(
        &mut self,
        input: Resume<T, E>,
    ) -> Result<Step<T, E, Self::Output>, E>;
}

impl<T, E, C> Coroutine<T, E> for Box<C>
where
    C: Coroutine<T, E> + ?Sized,
{
    type Output = C::Output;

    fn resume(
        &mut self,
        input: Resume<T, E>,
    ) -> Result<Step<T, E, Self::Output>, E> {
        (**self).resume(input)
    }
}
