//! Array-style transforms over future values.
//!
//! A [`Payload`] is either a single value or a sequence. Transforms treat a
//! scalar as a one-element sequence and hand a scalar back whenever the
//! result still has exactly one element, so scalar in means scalar out.

use std::vec;

use crate::{Error, future::Future};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Payload<T> {
    Scalar(T),
    Sequence(Vec<T>),
}

impl<T> Payload<T> {
    pub fn len(&self) -> usize {
        match self {
            Payload::Scalar(_) => 1,
            Payload::Sequence(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Payload::Scalar(_))
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Payload::Scalar(value) => vec![value],
            Payload::Sequence(items) => items,
        }
    }

    /// The scalar, or the first element of a sequence.
    pub fn into_first(self) -> Option<T> {
        self.into_iter().next()
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Payload<U> {
        match self {
            Payload::Scalar(value) => Payload::Scalar(f(value)),
            Payload::Sequence(items) => {
                Payload::Sequence(items.into_iter().map(f).collect())
            }
        }
    }

    /// A filtered-out scalar becomes an empty sequence.
    pub fn filter(self, mut predicate: impl FnMut(&T) -> bool) -> Self {
        match self {
            Payload::Scalar(value) if predicate(&value) => {
                Payload::Scalar(value)
            }
            Payload::Scalar(_) => Payload::Sequence(Vec::new()),
            Payload::Sequence(items) => {
                Payload::Sequence(items.into_iter().filter(predicate).collect())
            }
        }
    }
}

impl<T> From<Vec<T>> for Payload<T> {
    fn from(items: Vec<T>) -> Self {
        Payload::Sequence(items)
    }
}

impl<T> IntoIterator for Payload<T> {
    type Item = T;
    type IntoIter = vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

impl<T, E> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Lifts the value into a scalar payload.
    pub fn scalar(&self) -> Future<Payload<T>, E> {
        self.then(|value| Ok(Payload::Scalar(value)))
    }
}

impl<T, E> Future<Vec<T>, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Lifts the values into a sequence payload.
    pub fn sequence(&self) -> Future<Payload<T>, E> {
        self.then(|items| Ok(Payload::Sequence(items)))
    }
}

impl<T, E> Future<Payload<T>, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    pub fn map<U, F>(&self, f: F) -> Future<Payload<U>, E>
    where
        U: Clone + 'static,
        F: FnMut(T) -> U + 'static,
    {
        self.then(move |payload| Ok(payload.map(f)))
    }

    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: FnMut(&T) -> bool + 'static,
    {
        self.then(move |payload| Ok(payload.filter(predicate)))
    }

    /// Folds the payload with its first element as the seed.
    ///
    /// An empty payload rejects with [`Error::EmptyReduce`].
    pub fn reduce<F>(&self, f: F) -> Future<T, E>
    where
        F: FnMut(T, T) -> T + 'static,
        E: From<Error>,
    {
        self.then(move |payload| -> Result<T, E> {
            let mut items = payload.into_iter();
            let seed = items.next().ok_or(Error::EmptyReduce)?;
            Ok(items.fold(seed, f))
        })
    }

    pub fn fold<A, F>(&self, init: A, f: F) -> Future<A, E>
    where
        A: Clone + 'static,
        F: FnMut(A, T) -> A + 'static,
    {
        self.then(move |payload| Ok(payload.into_iter().fold(init, f)))
    }

    pub fn some<F>(&self, mut predicate: F) -> Future<bool, E>
    where
        F: FnMut(&T) -> bool + 'static,
    {
        self.then(move |payload| {
            Ok(payload.into_iter().any(|item| predicate(&item)))
        })
    }
}
