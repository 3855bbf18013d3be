use std::fmt;

use crate::future::{Future, Resolver};

/// A value that settles later and can hand its outcome to a [`Resolver`].
///
/// Resolving a future with a thenable makes the future adopt the thenable's
/// eventual outcome instead of treating the thenable itself as the value.
/// Implementations call `resolver.resolve` or `resolver.reject` once the
/// outcome is known, on this thread, now or from a later task. Only the first
/// call has an effect.
///
/// Returning `Err` from `then` rejects the adopting future with that reason.
pub trait Thenable<T, E> {
    fn then(self: Box<Self>, resolver: Resolver<T, E>) -> Result<(), E>;
}

/// Everything a future can be resolved with.
pub enum Resolution<T, E> {
    Value(T),
    Error(E),
    /// Adopt the outcome of another thenable.
    Thenable(Box<dyn Thenable<T, E>>),
}

impl<T, E> Resolution<T, E> {
    pub fn adopt(thenable: impl Thenable<T, E> + 'static) -> Self {
        Resolution::Thenable(Box::new(thenable))
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Resolution<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Value(value) => {
                f.debug_tuple("Value").field(value).finish()
            }
            Resolution::Error(reason) => {
                f.debug_tuple("Error").field(reason).finish()
            }
            Resolution::Thenable(_) => f.write_str("Thenable(..)"),
        }
    }
}

impl<T, E> From<Future<T, E>> for Resolution<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    fn from(future: Future<T, E>) -> Self {
        Resolution::adopt(future)
    }
}

/// Conversion into a [`Resolution`].
///
/// Reaction closures return any implementor: `Ok(value)`, `Err(reason)`, a
/// [`Future`] to adopt, or a [`Resolution`] built by hand.
pub trait IntoResolution<T, E> {
    fn into_resolution(self) -> Resolution<T, E>;
}

impl<T, E> IntoResolution<T, E> for Resolution<T, E> {
    fn into_resolution(self) -> Resolution<T, E> {
        self
    }
}

impl<T, E> IntoResolution<T, E> for Result<T, E> {
    fn into_resolution(self) -> Resolution<T, E> {
        match self {
            Ok(value) => Resolution::Value(value),
            Err(reason) => Resolution::Error(reason),
        }
    }
}

impl<T, E> IntoResolution<T, E> for Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    fn into_resolution(self) -> Resolution<T, E> {
        Resolution::adopt(self)
    }
}
