//! Adapts callback-style functions into future-returning ones.

use std::fmt;

use settle_core::{Future, Payload, Resolver};
use tracing::trace;

/// How a promisified function's arguments and callback are shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Exact argument count handed to the wrapped function. Extra arguments
    /// are dropped, missing ones are `None`. `None` keeps every argument.
    pub argument_count: Option<usize>,
    /// Whether the callback's first slot carries an error.
    pub has_error_arg: bool,
    /// Resolve with every callback value instead of just the first.
    pub more_cb_values: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            argument_count: None,
            has_error_arg: true,
            more_cb_values: false,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn argument_count(mut self, count: usize) -> Self {
        self.argument_count = Some(count);
        self
    }

    pub fn has_error_arg(mut self, has_error_arg: bool) -> Self {
        self.has_error_arg = has_error_arg;
        self
    }

    pub fn more_cb_values(mut self, more_cb_values: bool) -> Self {
        self.more_cb_values = more_cb_values;
        self
    }
}

/// The completion callback handed to a promisified function.
///
/// Only the first completion counts.
pub struct Callback<T, E> {
    resolver: Resolver<Payload<T>, E>,
    options: Options,
}

impl<T, E> Clone for Callback<T, E> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            options: self.options,
        }
    }
}

impl<T, E> fmt::Debug for Callback<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<T, E> Callback<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Completes with an optional error followed by the callback values.
    ///
    /// When the function has no error slot `error` is ignored. Otherwise a
    /// present error rejects and the values are dropped.
    pub fn call(&self, error: Option<E>, values: Vec<T>) {
        if self.options.has_error_arg {
            if let Some(reason) = error {
                return self.resolver.reject(reason);
            }
        }
        let payload = if self.options.more_cb_values {
            Payload::Sequence(values)
        } else {
            match values.into_iter().next() {
                Some(value) => Payload::Scalar(value),
                None => Payload::Sequence(Vec::new()),
            }
        };
        self.resolver.resolve(payload);
    }

    pub fn ok(&self, value: T) {
        self.call(None, vec![value]);
    }

    pub fn err(&self, reason: E) {
        self.call(Some(reason), Vec::new());
    }
}

/// Wraps a callback-style function so that calling it returns a future.
///
/// `f` receives the arguments, shaped per `options`, and a [`Callback`] to
/// complete through. A value returned synchronously from `f` resolves the
/// future as a scalar unless the callback completed first.
pub fn promisify<A, T, E, F>(
    f: F,
    options: Options,
) -> impl Fn(Vec<A>) -> Future<Payload<T>, E>
where
    F: Fn(Vec<Option<A>>, Callback<T, E>) -> Option<T>,
    T: Clone + 'static,
    E: Clone + 'static,
{
    move |args| {
        let mut args: Vec<Option<A>> = args.into_iter().map(Some).collect();
        if let Some(count) = options.argument_count {
            args.resize_with(count, || None);
        }
        trace!(arguments = args.len(), "calling promisified function");
        Future::new(|resolver| {
            let callback = Callback {
                resolver: resolver.clone(),
                options,
            };
            if let Some(value) = f(args, callback) {
                resolver.resolve(Payload::Scalar(value));
            }
            Ok(())
        })
    }
}
