//! Settle-once futures with deferred, ordered reactions

pub mod error;
pub mod event_loop;
pub mod future;
pub mod payload;
pub mod progress;
pub mod resolution;
pub mod task;

pub use error::Error;
pub use event_loop::EventLoop;
pub use future::{Future, Resolver, State};
pub use payload::Payload;
pub use progress::Progress;
pub use resolution::{IntoResolution, Resolution, Thenable};
