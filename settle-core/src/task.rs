use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::event_loop::EventLoop;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Runs tasks later on the current thread.
///
/// This is the only capability futures need from their environment. Tasks
/// submitted through `schedule` must run in submission order, and never
/// synchronously inside the call that submitted them. Tasks submitted
/// through `schedule_after` must not run before `delay` has elapsed; timers
/// with equal deadlines run in submission order.
pub trait Schedule {
    fn schedule(&self, task: Task);

    fn schedule_after(&self, delay: Duration, task: Task);
}

thread_local! {
    static CURRENT: RefCell<Option<Rc<dyn Schedule>>> =
        const { RefCell::new(None) };
}

/// Returns the scheduler futures on this thread submit work to.
///
/// Falls back to [`EventLoop::local`] when nothing was entered.
pub fn current() -> Rc<dyn Schedule> {
    CURRENT
        .with_borrow(|current| current.clone())
        .unwrap_or_else(|| EventLoop::local() as Rc<dyn Schedule>)
}

/// Installs `scheduler` as the current scheduler until the guard drops.
pub fn enter(scheduler: Rc<dyn Schedule>) -> EnterGuard {
    let previous = CURRENT.replace(Some(scheduler));
    EnterGuard { previous }
}

/// Restores the previously entered scheduler on drop.
#[must_use = "the scheduler is only entered while the guard is alive"]
pub struct EnterGuard {
    previous: Option<Rc<dyn Schedule>>,
}

impl Drop for EnterGuard {
    fn drop(&mut self) {
        CURRENT.set(self.previous.take());
    }
}

pub fn spawn(task: impl FnOnce() + 'static) {
    current().schedule(Box::new(task));
}

pub fn spawn_after(delay: Duration, task: impl FnOnce() + 'static) {
    current().schedule_after(delay, Box::new(task));
}
