use settle_core::{Future, IntoResolution};
use settle_util::{Walk, walk_while};

use crate::cancel_flag;

/// Settles like the first item to settle.
///
/// The winner is whichever item delivers first, resolved or rejected. The
/// rest keep running but are ignored. An empty input resolves at once with
/// `None`.
pub fn race<I, T, E>(items: I) -> Future<Option<T>, E>
where
    I: IntoIterator,
    I::Item: IntoResolution<T, E>,
    T: Clone + 'static,
    E: Clone + 'static,
{
    Future::new(move |resolver| {
        let canceled = cancel_flag(&resolver);
        let walked = walk_while(
            items,
            || !canceled.get(),
            |_, item| {
                let canceled = canceled.clone();
                let resolver = resolver.clone();
                Future::from_resolution(item).watch(move |outcome| {
                    if !canceled.get() {
                        resolver.settle(outcome.map(Some));
                    }
                });
            },
        );
        if walked == Walk::Empty {
            resolver.resolve(None);
        }
        Ok(())
    })
}

pub trait RaceExt<T, E> {
    /// Settles like whichever of `self` and `other` settles first.
    fn race_with(&self, other: &Future<T, E>) -> Future<T, E>;
}

impl<T, E> RaceExt<T, E> for Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    fn race_with(&self, other: &Future<T, E>) -> Future<T, E> {
        let (winner, resolver) = Future::pending();
        for contender in [self, other] {
            let resolver = resolver.clone();
            contender.watch(move |outcome| resolver.settle(outcome));
        }
        winner
    }
}

#[cfg(test)]
mod tests {
    use std::{rc::Rc, time::Duration};

    use settle_core::{EventLoop, task::EnterGuard};

    use super::*;

    fn manual() -> (Rc<EventLoop>, EnterGuard) {
        let event_loop = Rc::new(EventLoop::builder().manual_clock().build());
        let guard = event_loop.enter();
        (event_loop, guard)
    }

    fn after(ms: u64, outcome: Result<i32, &'static str>) -> Future<i32, &'static str> {
        Future::from_resolution(outcome).delay(Duration::from_millis(ms))
    }

    #[test]
    fn first_settlement_wins() {
        let (event_loop, _guard) = manual();
        let future = race([after(30, Ok(1)), after(10, Ok(2)), after(20, Ok(3))]);
        event_loop.advance(Duration::from_millis(9)).unwrap();
        assert!(future.is_pending());
        event_loop.advance(Duration::from_millis(1)).unwrap();
        assert_eq!(future.outcome(), Some(Ok(Some(2))));
        event_loop.run().unwrap();
        assert_eq!(future.outcome(), Some(Ok(Some(2))));
    }

    #[test]
    fn first_rejection_wins_too() {
        let (event_loop, _guard) = manual();
        let future = race([after(30, Ok(1)), after(10, Err("fast"))]);
        event_loop.run().unwrap();
        assert_eq!(future.outcome(), Some(Err("fast")));
    }

    #[test]
    fn already_settled_items_win_in_input_order() {
        let (event_loop, _guard) = manual();
        let future = race(vec![Ok(7), Err("late"), Ok(9)]);
        event_loop.run_until_idle().unwrap();
        assert_eq!(future.outcome(), Some(Ok::<_, &str>(Some(7))));
    }

    #[test]
    fn empty_resolves_to_none() {
        let (_event_loop, _guard) = manual();
        let future = race(Vec::<Future<i32, ()>>::new());
        assert_eq!(future.outcome(), Some(Ok(None)));
    }

    #[test]
    fn canceled_race_never_settles() {
        let (event_loop, _guard) = manual();
        let future = race([after(5, Ok(1))]);
        future.cancel();
        event_loop.run().unwrap();
        assert!(future.is_canceled());
        assert_eq!(future.outcome(), None);
    }

    #[test]
    fn race_with_pairs() {
        let (event_loop, _guard) = manual();
        let future = after(20, Ok(1)).race_with(&after(15, Ok(2)));
        event_loop.run().unwrap();
        assert_eq!(future.outcome(), Some(Ok(2)));
    }
}
