mod common;

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    time::Duration,
};

use common::manual_loop;
use settle::{Payload, Resolver, State, task, prelude::*};

/// Settles after a delay, from the outside, like a timer-based API would.
struct Timeout {
    after: Duration,
    outcome: Result<&'static str, String>,
}

impl Thenable<&'static str, String> for Timeout {
    fn then(
        self: Box<Self>,
        resolver: Resolver<&'static str, String>,
    ) -> Result<(), String> {
        let Timeout { after, outcome } = *self;
        task::spawn_after(after, move || resolver.settle(outcome));
        Ok(())
    }
}

#[test]
fn resolved_reaction_runs_once_and_later() {
    let (event_loop, _guard) = manual_loop();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let next = Future::<_, String>::resolve("value").then(move |value| {
        counter.set(counter.get() + 1);
        Ok(value.len())
    });
    assert_eq!(calls.get(), 0);
    event_loop.run().unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(next.outcome(), Some(Ok(5)));
}

#[test]
fn rejected_reaction_runs_once_and_later() {
    let (event_loop, _guard) = manual_loop();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let source = Future::<i32, _>::reject("reason".to_string());
    let recovered = source.catch(move |reason| {
        counter.set(counter.get() + 1);
        Ok(reason.len() as i32)
    });
    assert_eq!(calls.get(), 0);
    event_loop.run().unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(recovered.outcome(), Some(Ok(6)));
    assert!(source.is_fulfilled());
}

#[test]
fn adopts_a_foreign_thenable() {
    let (event_loop, _guard) = manual_loop();
    let future = Future::<&'static str, String>::new(|resolver| {
        resolver.adopt(Timeout {
            after: Duration::from_millis(50),
            outcome: Ok("adopted"),
        });
        Ok(())
    });
    event_loop.advance(Duration::from_millis(49)).unwrap();
    assert_eq!(future.state(), State::Pending);
    event_loop.advance(Duration::from_millis(1)).unwrap();
    assert_eq!(future.outcome(), Some(Ok("adopted")));

    let failed = Future::<&'static str, String>::from_resolution(
        settle::Resolution::adopt(Timeout {
            after: Duration::from_millis(5),
            outcome: Err("timed out".into()),
        }),
    );
    event_loop.run().unwrap();
    assert_eq!(failed.outcome(), Some(Err("timed out".into())));
}

#[test]
fn cancel_silences_the_chain() {
    let (event_loop, _guard) = manual_loop();
    let hooked = Rc::new(Cell::new(false));
    let flag = Rc::clone(&hooked);
    let reacted = Rc::new(Cell::new(false));
    let (future, resolver) = Future::<i32, String>::pending();
    resolver.on_cancel(move || flag.set(true));

    let seen = Rc::clone(&reacted);
    let downstream = future
        .then(move |value| {
            seen.set(true);
            Ok(value)
        })
        .catch(|_| Ok(0));
    task::spawn_after(Duration::from_millis(10), move || resolver.resolve(1));

    future.cancel();
    event_loop.run().unwrap();
    assert!(hooked.get());
    assert!(!reacted.get());
    assert!(future.is_canceled());
    assert!(downstream.is_pending());
}

#[test]
fn delay_settles_on_schedule() {
    let (event_loop, _guard) = manual_loop();
    let delayed = Future::<_, String>::resolve(1).delay(Duration::from_millis(100));
    event_loop.advance(Duration::from_millis(90)).unwrap();
    assert!(delayed.is_pending());
    event_loop.advance(Duration::from_millis(20)).unwrap();
    assert_eq!(delayed.outcome(), Some(Ok(1)));
}

#[test]
fn callback_receives_error_first() {
    let (event_loop, _guard) = manual_loop();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    let ok = Future::<i32, String>::resolve(1)
        .callback(Some(move |error, value| sink.borrow_mut().push((error, value))));
    let sink = Rc::clone(&calls);
    let err = Future::<i32, String>::reject("bad".into())
        .callback(Some(move |error, value| sink.borrow_mut().push((error, value))));
    event_loop.run().unwrap();
    assert_eq!(
        *calls.borrow(),
        [(None, Some(1)), (Some("bad".to_string()), None)]
    );
    assert_eq!(ok.outcome(), Some(Ok(1)));
    assert_eq!(err.outcome(), Some(Err("bad".into())));
}

#[test]
fn finally_preserves_the_outcome() {
    let (event_loop, _guard) = manual_loop();
    let cleaned = Rc::new(Cell::new(0));
    let counter = Rc::clone(&cleaned);
    let kept = Future::<i32, String>::reject("original".into()).finally(move || {
        counter.set(counter.get() + 1);
        Ok::<_, String>(())
    });
    let overridden = Future::<i32, String>::resolve(1)
        .finally(|| Err::<(), _>("cleanup".to_string()));
    event_loop.run().unwrap();
    assert_eq!(cleaned.get(), 1);
    assert_eq!(kept.outcome(), Some(Err("original".into())));
    assert_eq!(overridden.outcome(), Some(Err("cleanup".into())));
}

#[test]
fn transforms_keep_scalars_scalar() {
    let (event_loop, _guard) = manual_loop();
    let scalar = Future::<_, String>::resolve(3).scalar().map(|v| v * 2);
    let sequence = Future::<_, String>::resolve(vec![1, 2, 3, 4])
        .sequence()
        .filter(|v| v % 2 == 1)
        .map(|v| v * 10);
    event_loop.run().unwrap();
    assert_eq!(scalar.outcome(), Some(Ok(Payload::Scalar(6))));
    assert_eq!(sequence.outcome(), Some(Ok(Payload::Sequence(vec![10, 30]))));
}

#[test]
fn progress_reaches_listeners_in_order() {
    let (_event_loop, _guard) = manual_loop();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let (future, resolver) = Future::<(), String>::pending();
    for name in ["first", "second"] {
        let sink = Rc::clone(&seen);
        let _ = future.progress(move |progress| {
            if let Some(percent) = progress.downcast_ref::<u8>() {
                sink.borrow_mut().push(format!("{name} {percent}%"));
            }
            Ok(())
        });
    }
    resolver.notify(50_u8);
    assert_eq!(*seen.borrow(), ["first 50%", "second 50%"]);
}
