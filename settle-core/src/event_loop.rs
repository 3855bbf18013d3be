//! Default single-threaded scheduler.
//!
//! An [`EventLoop`] owns a FIFO queue of ready tasks and a heap of timers.
//! Nothing runs until the loop is driven with [`EventLoop::run_until_idle`],
//! [`EventLoop::advance`], [`EventLoop::run`] or [`EventLoop::run_until`].
//! Ready tasks always drain before the next due timer fires, so reactions
//! scheduled by a timer callback run before the following timer.
//!
//! # Defaults
//!
//! | Field        | Default      | Environment         |
//! |--------------|--------------|---------------------|
//! | `clock`      | system clock | `SETTLE_CLOCK`      |
//! | `turn_limit` | unlimited    | `SETTLE_TURN_LIMIT` |

use std::{
    cell::{Cell, RefCell},
    cmp::Ordering,
    collections::{BinaryHeap, VecDeque},
    env,
    rc::Rc,
    thread,
    time::{Duration, Instant},
};

use tracing::{trace, warn};

use crate::{
    Error,
    task::{self, EnterGuard, Schedule, Task},
};

/// Which time source a loop reads deadlines from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockKind {
    /// Monotonic wall time; waiting for a timer sleeps the thread.
    #[default]
    System,
    /// Virtual time that only moves when the loop is told to move it.
    Manual,
}

/// Event loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub clock: ClockKind,
    /// Maximum tasks a single driving call may run (`None` = unlimited).
    pub turn_limit: Option<usize>,
}

impl Config {
    pub const CLOCK_VAR: &'static str = "SETTLE_CLOCK";
    pub const TURN_LIMIT_VAR: &'static str = "SETTLE_TURN_LIMIT";

    /// Reads overrides from the process environment on top of the defaults.
    pub fn from_env() -> Result<Self, Error> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides produced by `lookup`, keyed by variable name.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        if let Some(value) = lookup(Self::CLOCK_VAR) {
            self.clock = match value.trim().to_ascii_lowercase().as_str() {
                "system" => ClockKind::System,
                "manual" => ClockKind::Manual,
                _ => {
                    return Err(Error::InvalidConfig {
                        key: Self::CLOCK_VAR,
                        value,
                    });
                }
            };
        }
        if let Some(value) = lookup(Self::TURN_LIMIT_VAR) {
            match value.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => self.turn_limit = Some(limit),
                _ => {
                    return Err(Error::InvalidConfig {
                        key: Self::TURN_LIMIT_VAR,
                        value,
                    });
                }
            }
        }
        Ok(self)
    }
}

/// Builder for [`EventLoop`].
#[derive(Debug, Clone, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn manual_clock(mut self) -> Self {
        self.config.clock = ClockKind::Manual;
        self
    }

    pub fn turn_limit(mut self, limit: usize) -> Self {
        self.config.turn_limit = Some(limit);
        self
    }

    pub fn build(self) -> EventLoop {
        let clock = match self.config.clock {
            ClockKind::System => Clock::System(Instant::now()),
            ClockKind::Manual => Clock::Manual(Cell::new(Duration::ZERO)),
        };
        EventLoop {
            config: self.config,
            clock,
            ready: RefCell::new(VecDeque::new()),
            timers: RefCell::new(BinaryHeap::new()),
            sequence: Cell::new(0),
        }
    }
}

enum Clock {
    System(Instant),
    Manual(Cell<Duration>),
}

impl Clock {
    fn now(&self) -> Duration {
        match self {
            Clock::System(origin) => origin.elapsed(),
            Clock::Manual(now) => now.get(),
        }
    }
}

struct Timer {
    deadline: Duration,
    sequence: u64,
    task: Task,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.sequence == other.sequence
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    // reversed: `BinaryHeap` is a max-heap, the earliest timer must be on top
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Single-threaded task queue with timers.
pub struct EventLoop {
    config: Config,
    clock: Clock,
    ready: RefCell<VecDeque<Task>>,
    timers: RefCell<BinaryHeap<Timer>>,
    sequence: Cell<u64>,
}

thread_local! {
    static LOCAL: Rc<EventLoop> = Rc::new(local_loop());
}

fn local_loop() -> EventLoop {
    let config = Config::from_env().unwrap_or_else(|error| {
        warn!(%error, "ignoring event loop environment overrides");
        Config::default()
    });
    EventLoop::builder().config(config).build()
}

impl EventLoop {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// The loop futures on this thread use when no scheduler was entered.
    pub fn local() -> Rc<EventLoop> {
        LOCAL.with(Rc::clone)
    }

    /// Makes this loop the current scheduler until the guard drops.
    pub fn enter(self: &Rc<Self>) -> EnterGuard {
        task::enter(Rc::clone(self) as Rc<dyn Schedule>)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Time elapsed since the loop was built.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn pending_tasks(&self) -> usize {
        self.ready.borrow().len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending_tasks() == 0 && self.pending_timers() == 0
    }

    /// Runs ready tasks and due timers until neither is left.
    ///
    /// Time does not move; timers that are not yet due stay queued.
    /// Returns the number of tasks run.
    pub fn run_until_idle(&self) -> Result<usize, Error> {
        let mut turns = Turns::new(self.config.turn_limit);
        self.drain(&mut turns)?;
        Ok(turns.count)
    }

    /// Moves virtual time forward by `by`, firing timers in deadline order
    /// and draining ready tasks after each one.
    pub fn advance(&self, by: Duration) -> Result<usize, Error> {
        let Clock::Manual(now) = &self.clock else {
            return Err(Error::ManualClockRequired);
        };
        let target = now.get() + by;
        let mut turns = Turns::new(self.config.turn_limit);
        self.drain(&mut turns)?;
        while let Some(deadline) =
            self.next_deadline().filter(|deadline| *deadline <= target)
        {
            now.set(now.get().max(deadline));
            self.drain(&mut turns)?;
        }
        now.set(target);
        self.drain(&mut turns)?;
        Ok(turns.count)
    }

    /// Drives the loop until no tasks and no timers remain.
    pub fn run(&self) -> Result<usize, Error> {
        let mut turns = Turns::new(self.config.turn_limit);
        loop {
            self.drain(&mut turns)?;
            match self.next_deadline() {
                Some(deadline) => self.wait_until(deadline),
                None => return Ok(turns.count),
            }
        }
    }

    /// Drives the loop until `done` returns true or nothing is left to run.
    ///
    /// Returns the final value of `done`.
    pub fn run_until(
        &self,
        mut done: impl FnMut() -> bool,
    ) -> Result<bool, Error> {
        let mut turns = Turns::new(self.config.turn_limit);
        loop {
            if done() {
                return Ok(true);
            }
            if self.step(&mut turns)? {
                continue;
            }
            match self.next_deadline() {
                Some(deadline) => self.wait_until(deadline),
                None => return Ok(done()),
            }
        }
    }

    fn drain(&self, turns: &mut Turns) -> Result<(), Error> {
        while self.step(turns)? {}
        Ok(())
    }

    /// Runs one ready task or due timer, if any. The budget is charged
    /// before the task leaves its queue, so a refused task stays queued.
    fn step(&self, turns: &mut Turns) -> Result<bool, Error> {
        if !self.has_runnable() {
            return Ok(false);
        }
        turns.take()?;
        match self.next_runnable() {
            Some(task) => {
                task();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn has_runnable(&self) -> bool {
        let now = self.clock.now();
        !self.ready.borrow().is_empty()
            || self.next_deadline().is_some_and(|deadline| deadline <= now)
    }

    fn next_runnable(&self) -> Option<Task> {
        let task = self.ready.borrow_mut().pop_front();
        task.or_else(|| self.pop_due_timer())
    }

    fn pop_due_timer(&self) -> Option<Task> {
        let now = self.clock.now();
        let mut timers = self.timers.borrow_mut();
        if timers.peek().is_some_and(|timer| timer.deadline <= now) {
            timers.pop().map(|timer| timer.task)
        } else {
            None
        }
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.timers.borrow().peek().map(|timer| timer.deadline)
    }

    fn wait_until(&self, deadline: Duration) {
        match &self.clock {
            Clock::Manual(now) => now.set(now.get().max(deadline)),
            Clock::System(origin) => {
                let elapsed = origin.elapsed();
                if deadline > elapsed {
                    thread::sleep(deadline - elapsed);
                }
            }
        }
    }
}

impl Schedule for EventLoop {
    fn schedule(&self, task: Task) {
        self.ready.borrow_mut().push_back(task);
    }

    fn schedule_after(&self, delay: Duration, task: Task) {
        let deadline = self.clock.now() + delay;
        let sequence = self.sequence.get();
        self.sequence.set(sequence + 1);
        trace!(?deadline, sequence, "timer scheduled");
        self.timers.borrow_mut().push(Timer {
            deadline,
            sequence,
            task,
        });
    }
}

struct Turns {
    limit: Option<usize>,
    count: usize,
}

impl Turns {
    fn new(limit: Option<usize>) -> Self {
        Self { limit, count: 0 }
    }

    fn take(&mut self) -> Result<(), Error> {
        if let Some(limit) = self.limit.filter(|limit| self.count >= *limit) {
            warn!(limit, "event loop turn limit reached");
            return Err(Error::TurnLimit { limit });
        }
        self.count += 1;
        Ok(())
    }
}
