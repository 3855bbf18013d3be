use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use settle_core::{Future, IntoResolution};
use settle_util::{Walk, walk_while};
use tracing::trace;

use crate::cancel_flag;

/// Progress notification sent by [`all`] each time one of its items
/// resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled<T> {
    /// Position of the item in the input.
    pub index: usize,
    pub value: T,
}

/// Waits for every item to resolve.
///
/// Values are delivered in input order, not settlement order. The first
/// rejection rejects the aggregate and the remaining items are ignored. An
/// empty input resolves at once with an empty vector.
///
/// Items that are not futures are coerced with [`Future::from_resolution`].
/// Canceling the aggregate stops it from pulling further items and from
/// reacting to the ones already pulled.
pub fn all<I, T, E>(items: I) -> Future<Vec<T>, E>
where
    I: IntoIterator,
    I::Item: IntoResolution<T, E>,
    T: Clone + 'static,
    E: Clone + 'static,
{
    Future::new(move |resolver| {
        let canceled = cancel_flag(&resolver);
        let values = Rc::new(RefCell::new(Vec::new()));
        let remaining = Rc::new(Cell::new(0));
        let rejected = Rc::new(Cell::new(false));

        let walked = walk_while(
            items,
            || !canceled.get(),
            |index, item| {
                values.borrow_mut().push(None);
                let values = Rc::clone(&values);
                let remaining = Rc::clone(&remaining);
                let canceled = Rc::clone(&canceled);
                let rejected = Rc::clone(&rejected);
                let resolver = resolver.clone();
                Future::from_resolution(item).watch(move |outcome| {
                    if canceled.get() || rejected.get() {
                        return;
                    }
                    let value = match outcome {
                        Ok(value) => value,
                        Err(reason) => {
                            rejected.set(true);
                            return resolver.reject(reason);
                        }
                    };
                    resolver.notify(Settled {
                        index,
                        value: value.clone(),
                    });
                    values.borrow_mut()[index] = Some(value);
                    remaining.set(remaining.get() - 1);
                    if remaining.get() > 0 {
                        return;
                    }
                    let values = values.borrow_mut().drain(..).collect();
                    if let Some(values) = values {
                        resolver.resolve(values);
                    }
                });
            },
        );

        trace!(?walked, "all walked its items");
        match walked {
            Walk::Empty => resolver.resolve(Vec::new()),
            Walk::Visited(count) => remaining.set(count),
        }
        Ok(())
    })
}

/// Waits for every future in a tuple to resolve.
///
/// Unlike [`all`] the futures may carry different value types; they share
/// the failure type.
pub trait Join {
    /// The resulting future type.
    type Output;

    /// Resolves to a tuple of values once every future resolved, or rejects
    /// with the first rejection.
    fn join(self) -> Self::Output;
}

pub trait JoinExt<T, E> {
    fn along_with<U>(&self, other: &Future<U, E>) -> Future<(T, U), E>
    where
        U: Clone + 'static;
}

impl<T, E> JoinExt<T, E> for Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    fn along_with<U>(&self, other: &Future<U, E>) -> Future<(T, U), E>
    where
        U: Clone + 'static,
    {
        (self.clone(), other.clone()).join()
    }
}

macro_rules! impl_join_tuple {
    ($($F:ident)+) => {
        impl<E, $($F),+> Join for ($(Future<$F, E>,)+)
        where
            E: Clone + 'static,
            $($F: Clone + 'static,)+
        {
            type Output = Future<($($F,)+), E>;

            #[allow(non_snake_case)]
            fn join(self) -> Self::Output {
                let ($($F,)+) = self;
                Future::<($($F,)+), E>::new(move |resolver| {
                    $(let $F = (Rc::new(RefCell::new(None::<$F>)), $F);)+

                    let slots = ($(Rc::clone(&$F.0),)+);
                    let finish = Rc::new({
                        let resolver = resolver.clone();
                        move || {
                            let ($($F,)+) = &slots;
                            // resolves only once every slot is filled
                            if let ($(Some($F),)+) = ($($F.borrow().clone(),)+) {
                                resolver.resolve(($($F,)+));
                            }
                        }
                    });

                    $({
                        let (slot, future) = $F;
                        let finish = Rc::clone(&finish);
                        let resolver = resolver.clone();
                        future.watch(move |outcome| match outcome {
                            Ok(value) => {
                                *slot.borrow_mut() = Some(value);
                                finish();
                            }
                            Err(reason) => resolver.reject(reason),
                        });
                    })+
                    Ok(())
                })
            }
        }
    };
}

impl_join_tuple!(A B);
impl_join_tuple!(A B C);
impl_join_tuple!(A B C D);
impl_join_tuple!(A B C D F);
impl_join_tuple!(A B C D F G);
impl_join_tuple!(A B C D F G H);
impl_join_tuple!(A B C D F G H I);
