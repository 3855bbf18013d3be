use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use settle_core::{Future, Payload, Resolver};
use settle_util::{Await, Coroutine, Resume, Step};
use tracing::trace;

use crate::{all, cancel_flag};

/// Drives `coroutine` to completion.
///
/// Each awaited item is settled first: a single item resumes the coroutine
/// with a scalar, a batch is awaited with [`all`] and resumes it with a
/// sequence in input order. Rejections are thrown back into the coroutine,
/// which can recover or fail. The returned future settles with whatever
/// the coroutine completes with.
///
/// Canceling the returned future stops the coroutine at its next
/// resumption.
pub fn flow<C, T, E>(coroutine: C) -> Future<C::Output, E>
where
    C: Coroutine<T, E> + 'static,
    C::Output: Clone + 'static,
    T: Clone + 'static,
    E: Clone + 'static,
{
    Future::new(|resolver| {
        let canceled = cancel_flag(&resolver);
        let coroutine = Rc::new(RefCell::new(coroutine));
        resume(coroutine, resolver, canceled, Resume::Start);
        Ok(())
    })
}

/// Builds the coroutine from `args` with `factory`, then drives it.
pub fn flow_with<A, C, T, E>(
    factory: impl FnOnce(A) -> C,
    args: A,
) -> Future<C::Output, E>
where
    C: Coroutine<T, E> + 'static,
    C::Output: Clone + 'static,
    T: Clone + 'static,
    E: Clone + 'static,
{
    flow(factory(args))
}

fn resume<C, T, E>(
    coroutine: Rc<RefCell<C>>,
    resolver: Resolver<C::Output, E>,
    canceled: Rc<Cell<bool>>,
    input: Resume<T, E>,
) where
    C: Coroutine<T, E> + 'static,
    C::Output: Clone + 'static,
    T: Clone + 'static,
    E: Clone + 'static,
{
    if canceled.get() {
        trace!("flow canceled, not resuming");
        return;
    }
    let step = coroutine.borrow_mut().resume(input);
    let awaited = match step {
        Ok(Step::Await(awaited)) => awaited,
        Ok(Step::Complete(result)) => return resolver.settle(result),
        Err(reason) => return resolver.reject(reason),
    };
    let next: Future<Payload<T>, E> = match awaited {
        Await::One(item) => Future::from_resolution(item).scalar(),
        Await::All(items) => all(items).sequence(),
    };
    next.watch(move |outcome| {
        let input = match outcome {
            Ok(payload) => Resume::Next(payload),
            Err(reason) => Resume::Throw(reason),
        };
        resume(coroutine, resolver, canceled, input);
    });
}
