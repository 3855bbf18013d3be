//! Combinators over settle futures

use std::{cell::Cell, rc::Rc};

use settle_core::Resolver;

pub mod flow;
pub mod join;
pub mod promisify;
pub mod race;

pub use flow::{flow, flow_with};
pub use join::{Join, JoinExt, Settled, all};
pub use promisify::{Callback, Options, promisify};
pub use race::{RaceExt, race};

/// Flag raised when the resolver's future is canceled.
pub(crate) fn cancel_flag<T, E>(resolver: &Resolver<T, E>) -> Rc<Cell<bool>>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    let canceled = Rc::new(Cell::new(false));
    let flag = Rc::clone(&canceled);
    resolver.on_cancel(move || flag.set(true));
    canceled
}
