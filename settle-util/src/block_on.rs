use std::{cell::RefCell, rc::Rc};

use settle_core::{Error, EventLoop, Future};
use tracing::debug;

/// Why [`block_on`] returned without a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockError<E> {
    #[error("future rejected")]
    Rejected(E),
    #[error("future was canceled")]
    Canceled,
    /// The loop ran out of tasks and timers while the future was pending.
    #[error("event loop went idle before the future settled")]
    Stalled,
    #[error(transparent)]
    EventLoop(#[from] Error),
}

/// Drives the thread's default loop until `future` settles.
pub fn block_on<T, E>(future: &Future<T, E>) -> Result<T, BlockError<E>>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    block_on_with(&EventLoop::local(), future)
}

/// Drives `event_loop` until `future` settles, sleeping through timers on a
/// system clock and jumping over them on a manual one.
///
/// Observing the future does not count as handling it.
pub fn block_on_with<T, E>(
    event_loop: &Rc<EventLoop>,
    future: &Future<T, E>,
) -> Result<T, BlockError<E>>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    let _guard = event_loop.enter();
    let slot = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&slot);
    future.watch(move |outcome| *sink.borrow_mut() = Some(outcome));

    event_loop.run_until(|| slot.borrow().is_some() || future.is_canceled())?;
    let outcome = slot.borrow_mut().take();
    match outcome {
        Some(Ok(value)) => Ok(value),
        Some(Err(reason)) => Err(BlockError::Rejected(reason)),
        None if future.is_canceled() => Err(BlockError::Canceled),
        None => {
            debug!(state = ?future.state(), "event loop stalled");
            Err(BlockError::Stalled)
        }
    }
}
