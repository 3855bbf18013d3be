mod common;

use std::time::Duration;

use common::{manual_loop, test_proptest_config};
use proptest::prelude::*;
use settle::{
    Callback, Options, Payload, Resume, Step, all, flow, promisify, race,
    step_fn, task, prelude::*,
};

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i64),
    Text(&'static str),
    Bool(bool),
}

fn after<T: Clone + 'static>(ms: u64, value: T) -> Future<T, String> {
    Future::resolve(value).delay(Duration::from_millis(ms))
}

#[test]
fn all_keeps_position_order_for_mixed_values() {
    let (event_loop, _guard) = manual_loop();
    let future = all([
        after(20, Value::Int(1)),
        after(0, Value::Int(0)),
        after(10, Value::Text("test")),
        after(5, Value::Bool(false)),
    ]);
    event_loop.run().unwrap();
    assert_eq!(
        future.outcome(),
        Some(Ok(vec![
            Value::Int(1),
            Value::Int(0),
            Value::Text("test"),
            Value::Bool(false),
        ]))
    );
}

#[test]
fn all_fails_fast() {
    let (event_loop, _guard) = manual_loop();
    let failing =
        Future::<i32, String>::reject("broken".into()).delay(Duration::from_millis(5));
    let future = all([after(50, 1), failing, after(1, 3)]);
    event_loop.advance(Duration::from_millis(5)).unwrap();
    assert_eq!(future.outcome(), Some(Err("broken".into())));
}

#[test]
fn empty_inputs_resolve_immediately() {
    let (_event_loop, _guard) = manual_loop();
    let none: Vec<Future<i32, String>> = Vec::new();
    assert_eq!(all(none.clone()).outcome(), Some(Ok(vec![])));
    assert_eq!(race(none).outcome(), Some(Ok(None)));
}

#[test]
fn race_follows_the_fastest() {
    let (event_loop, _guard) = manual_loop();
    let future = race([after(30, "slow"), after(10, "fast"), after(20, "middle")]);
    event_loop.advance(Duration::from_millis(10)).unwrap();
    assert_eq!(future.outcome(), Some(Ok(Some("fast"))));
}

fn read_file(path: Vec<Option<&'static str>>, done: Callback<String, String>) -> Option<String> {
    task::spawn_after(Duration::from_millis(3), move || match path.first() {
        Some(Some("exists.txt")) => done.call(None, vec!["contents".into()]),
        Some(Some(other)) => done.err(format!("{other}: not found")),
        _ => done.err("no path".into()),
    });
    None
}

#[test]
fn promisify_bridges_both_outcomes() {
    let (event_loop, _guard) = manual_loop();
    let read = promisify(read_file, Options::new().argument_count(1));
    let found = read(vec!["exists.txt", "ignored"]);
    let missing = read(vec!["missing.txt"]);
    let empty = read(Vec::new());
    event_loop.run().unwrap();
    assert_eq!(
        found.outcome(),
        Some(Ok(Payload::Scalar("contents".to_string())))
    );
    assert_eq!(missing.outcome(), Some(Err("missing.txt: not found".into())));
    assert_eq!(empty.outcome(), Some(Err("no path".into())));
}

#[test]
fn flow_reads_like_sequential_code() {
    let (event_loop, _guard) = manual_loop();
    let mut total = 0;
    let future = flow(step_fn(move |input: Resume<i64, String>| {
        match input {
            Resume::Start => return Ok(Step::await_one(after(5, 1))),
            Resume::Next(payload) => total += payload.into_iter().sum::<i64>(),
            Resume::Throw(reason) => return Err(reason),
        }
        if total < 10 {
            Ok(Step::await_all([after(1, total), after(2, 2)]))
        } else {
            Ok(Step::complete(Ok(total)))
        }
    }));
    event_loop.run().unwrap();
    // 1 -> 1 + (1 + 2) = 4 -> 4 + (4 + 2) = 10
    assert_eq!(future.outcome(), Some(Ok(10)));
}

proptest! {
    #![proptest_config(test_proptest_config(64))]

    #[test]
    fn race_matches_the_earliest_delay(delays in prop::collection::vec(1..200_u64, 1..10)) {
        let (event_loop, _guard) = manual_loop();
        let future = race(
            delays
                .iter()
                .enumerate()
                .map(|(index, delay)| after(*delay, index))
                .collect::<Vec<_>>(),
        );
        event_loop.run().unwrap();
        let earliest = delays.iter().min().copied();
        let winner = delays.iter().position(|delay| Some(*delay) == earliest);
        prop_assert_eq!(future.outcome(), Some(Ok(winner)));
    }
}
