//! Settle-once futures for single-threaded event loops.
//!
//! A [`Future`] holds a value that arrives later, or the reason it never
//! will. Reactions chain off it and always run on a later scheduler turn.
//!
//! ```
//! use std::{rc::Rc, time::Duration};
//!
//! use settle::{EventLoop, Future, block_on_with};
//!
//! let event_loop = Rc::new(EventLoop::builder().manual_clock().build());
//! let _guard = event_loop.enter();
//!
//! let answer = Future::<i32, String>::resolve(20)
//!     .delay(Duration::from_millis(100))
//!     .then(|value| Ok(value * 2 + 2));
//! assert_eq!(block_on_with(&event_loop, &answer), Ok(42));
//! ```

pub use settle_combinators;
pub use settle_core;
pub use settle_util;

pub use settle_combinators::{
    Callback, Join, JoinExt, Options, RaceExt, Settled, all, flow, flow_with,
    promisify, race,
};
pub use settle_core::{
    Error, EventLoop, Future, IntoResolution, Payload, Progress, Resolution,
    Resolver, State, Thenable, event_loop, task,
};
pub use settle_util::{
    Await, BlockError, Coroutine, Resume, Step, block_on, block_on_with,
    generate, step_fn,
};

/// The traits needed to call combinator methods on futures.
pub mod prelude {
    pub use crate::{
        Coroutine, Future, IntoResolution, Join, JoinExt, RaceExt, Thenable,
    };
}
