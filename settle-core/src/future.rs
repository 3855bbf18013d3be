use std::{any::Any, cell::RefCell, fmt, mem, rc::Rc, time::Duration};

use tracing::{debug, trace, warn};

use crate::{
    progress::Progress,
    resolution::{IntoResolution, Resolution, Thenable},
    task,
};

/// Lifecycle of a [`Future`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Pending,
    /// Settled with a value that no handler has consumed yet.
    Resolved,
    /// Settled with a reason that no handler has consumed yet.
    Rejected,
    /// A reaction handler ran and its result was forwarded downstream.
    Fulfilled,
    /// Terminal; nothing is delivered any more.
    Canceled,
}

/// Whether a reaction ran user code or only forwarded the outcome.
enum Delivery {
    Handled,
    Forwarded,
}

type Reaction<T, E> = Box<dyn FnOnce(Result<T, E>) -> Delivery>;
type Listener<E> = Rc<dyn Fn(&Progress) -> Result<(), E>>;

struct Inner<T, E> {
    state: State,
    outcome: Option<Result<T, E>>,
    /// Set once a resolver committed to a value or to a thenable.
    claimed: bool,
    /// Bumped on every adoption; only the newest adoption may settle.
    generation: u64,
    reactions: Vec<Reaction<T, E>>,
    on_cancel: Option<Box<dyn FnOnce()>>,
    cancelable: bool,
    listeners: Vec<Listener<E>>,
}

impl<T, E> Inner<T, E> {
    fn new() -> Self {
        Self {
            state: State::Pending,
            outcome: None,
            claimed: false,
            generation: 0,
            reactions: Vec::new(),
            on_cancel: None,
            cancelable: false,
            listeners: Vec::new(),
        }
    }
}

type Shared<T, E> = Rc<RefCell<Inner<T, E>>>;

/// A settle-once container for a value of type `T` or a failure of type `E`.
///
/// A `Future` starts pending and settles at most once, either by resolving
/// to a value or by rejecting with a reason. Reactions registered with
/// [`then`](Future::then) and friends run on a later scheduler turn, never
/// inside the call that registered them or the call that settled the future,
/// and always in registration order. Each reaction produces a new,
/// independent future.
///
/// Cloning a `Future` clones the handle, not the computation.
pub struct Future<T, E> {
    inner: Shared<T, E>,
}

impl<T, E> Clone for Future<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T, E> fmt::Debug for Future<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Future")
            .field("state", &inner.state)
            .field("reactions", &inner.reactions.len())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

/// Producer side of a [`Future`].
///
/// Bundles the capabilities handed to an executor: `resolve`, `reject`,
/// `on_cancel` and `notify`. Resolvers are cheap to clone; every clone
/// settles the same future and only the first settlement counts.
pub struct Resolver<T, E> {
    inner: Shared<T, E>,
    /// `None` for the original producer, `Some(n)` for the resolver handed
    /// to the `n`th adopted thenable.
    generation: Option<u64>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            generation: self.generation,
        }
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("state", &self.inner.borrow().state)
            .field("generation", &self.generation)
            .finish()
    }
}

fn complete<T, E>(inner: &Shared<T, E>, outcome: Result<T, E>)
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    let reactions = {
        let mut inner = inner.borrow_mut();
        if inner.state != State::Pending {
            return;
        }
        inner.state = match outcome {
            Ok(_) => State::Resolved,
            Err(_) => State::Rejected,
        };
        inner.outcome = Some(outcome);
        mem::take(&mut inner.reactions)
    };
    trace!(reactions = reactions.len(), "future settled");
    for reaction in reactions {
        dispatch(inner, reaction);
    }
}

fn dispatch<T, E>(inner: &Shared<T, E>, reaction: Reaction<T, E>)
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    let inner = Rc::clone(inner);
    task::spawn(move || {
        let outcome = {
            let inner = inner.borrow();
            if inner.state == State::Canceled {
                trace!("future canceled before delivery, skipping reaction");
                return;
            }
            match &inner.outcome {
                Some(outcome) => outcome.clone(),
                None => return,
            }
        };
        if let Delivery::Handled = reaction(outcome) {
            let mut inner = inner.borrow_mut();
            if inner.state != State::Canceled {
                inner.state = State::Fulfilled;
            }
        }
    });
}

impl<T, E> Resolver<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Whether this resolver may still settle its future. The original
    /// producer claims the future on first use.
    fn claim(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.state != State::Pending {
            return false;
        }
        match self.generation {
            None if inner.claimed => false,
            None => {
                inner.claimed = true;
                true
            }
            Some(generation) => {
                inner.claimed && inner.generation == generation
            }
        }
    }

    pub fn resolve(&self, value: T) {
        if self.claim() {
            complete(&self.inner, Ok(value));
        }
    }

    pub fn reject(&self, reason: E) {
        if self.claim() {
            complete(&self.inner, Err(reason));
        }
    }

    /// Settles with a value, a reason, or the eventual outcome of a thenable.
    pub fn settle(&self, resolution: impl IntoResolution<T, E>) {
        match resolution.into_resolution() {
            Resolution::Value(value) => self.resolve(value),
            Resolution::Error(reason) => self.reject(reason),
            Resolution::Thenable(thenable) => self.adopt_boxed(thenable),
        }
    }

    /// Locks the future onto `thenable`'s eventual outcome.
    ///
    /// The future stays pending until the thenable settles it; calls through
    /// other resolvers are ignored from here on.
    pub fn adopt(&self, thenable: impl Thenable<T, E> + 'static) {
        self.adopt_boxed(Box::new(thenable));
    }

    fn adopt_boxed(&self, thenable: Box<dyn Thenable<T, E>>) {
        if !self.claim() {
            return;
        }
        let generation = {
            let mut inner = self.inner.borrow_mut();
            inner.generation += 1;
            inner.generation
        };
        trace!(generation, "adopting thenable");
        let adopted = Resolver {
            inner: Rc::clone(&self.inner),
            generation: Some(generation),
        };
        if let Err(reason) = thenable.then(adopted.clone()) {
            debug!("thenable failed while subscribing");
            adopted.reject(reason);
        }
    }

    /// Registers the cancellation hook, replacing any previous one.
    ///
    /// The hook runs at most once. If the future is already canceled it runs
    /// immediately.
    pub fn on_cancel(&self, hook: impl FnOnce() + 'static) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.cancelable = true;
            if inner.state != State::Canceled {
                inner.on_cancel = Some(Box::new(hook));
                return;
            }
        }
        hook();
    }

    /// Calls every progress listener synchronously, in registration order.
    ///
    /// The first listener to fail rejects the future with its reason and
    /// stops the broadcast.
    pub fn notify<N: Any>(&self, value: N) {
        broadcast(&self.inner, Progress::new(value));
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.borrow().state == State::Canceled
    }

    /// The future this resolver settles.
    pub fn future(&self) -> Future<T, E> {
        Future {
            inner: Rc::clone(&self.inner),
        }
    }
}

fn broadcast<T, E>(inner: &Shared<T, E>, progress: Progress)
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    let listeners = {
        let inner = inner.borrow();
        if inner.state == State::Canceled {
            return;
        }
        inner.listeners.clone()
    };
    for listener in listeners {
        if let Err(reason) = listener(&progress) {
            warn!("progress listener failed, rejecting future");
            complete(inner, Err(reason));
            return;
        }
    }
}

impl<T, E> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Creates a future and runs `executor` synchronously with its resolver.
    ///
    /// An executor returning `Err` rejects the future, unless it already
    /// settled it.
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Resolver<T, E>) -> Result<(), E>,
    {
        let (future, resolver) = Self::pending();
        if let Err(reason) = executor(resolver.clone()) {
            debug!("executor failed");
            resolver.reject(reason);
        }
        future
    }

    /// Creates a pending future together with its resolver.
    pub fn pending() -> (Self, Resolver<T, E>) {
        let inner = Rc::new(RefCell::new(Inner::new()));
        let resolver = Resolver {
            inner: Rc::clone(&inner),
            generation: None,
        };
        (Self { inner }, resolver)
    }

    pub fn resolve(value: T) -> Self {
        Self::from_resolution(Ok(value))
    }

    pub fn reject(reason: E) -> Self {
        Self::from_resolution(Err(reason))
    }

    /// Coerces anything resolvable into a future, adopting thenables.
    pub fn from_resolution(resolution: impl IntoResolution<T, E>) -> Self {
        let (future, resolver) = Self::pending();
        resolver.settle(resolution);
        future
    }

    pub fn state(&self) -> State {
        self.inner.borrow().state
    }

    pub fn is_pending(&self) -> bool {
        self.state() == State::Pending
    }

    pub fn is_resolved(&self) -> bool {
        self.state() == State::Resolved
    }

    pub fn is_rejected(&self) -> bool {
        self.state() == State::Rejected
    }

    pub fn is_fulfilled(&self) -> bool {
        self.state() == State::Fulfilled
    }

    pub fn is_canceled(&self) -> bool {
        self.state() == State::Canceled
    }

    /// Whether the producer ever registered a cancellation hook.
    pub fn is_cancelable(&self) -> bool {
        self.inner.borrow().cancelable
    }

    /// A copy of the settled outcome, if any.
    ///
    /// Unlike the state predicates this keeps answering after a handler
    /// has consumed the outcome.
    pub fn outcome(&self) -> Option<Result<T, E>> {
        self.inner.borrow().outcome.clone()
    }

    fn register(&self, reaction: Reaction<T, E>) {
        let mut inner = self.inner.borrow_mut();
        let state = inner.state;
        match state {
            State::Canceled => trace!("future canceled, dropping reaction"),
            State::Pending => inner.reactions.push(reaction),
            _ => {
                drop(inner);
                dispatch(&self.inner, reaction);
            }
        }
    }

    fn chain<U, H>(&self, handler: H) -> Future<U, E>
    where
        U: Clone + 'static,
        H: FnOnce(Result<T, E>) -> (Resolution<U, E>, Delivery) + 'static,
    {
        let (next, resolver) = Future::pending();
        self.register(Box::new(move |outcome| {
            let (resolution, delivery) = handler(outcome);
            resolver.settle(resolution);
            delivery
        }));
        next
    }

    /// Reacts to a value. Rejections pass through untouched.
    pub fn then<U, F, R>(&self, on_resolved: F) -> Future<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> R + 'static,
        R: IntoResolution<U, E>,
    {
        self.chain(move |outcome| match outcome {
            Ok(value) => (on_resolved(value).into_resolution(), Delivery::Handled),
            Err(reason) => (Resolution::Error(reason), Delivery::Forwarded),
        })
    }

    /// Reacts to either branch.
    pub fn then_else<U, F, G, R, S>(
        &self,
        on_resolved: F,
        on_rejected: G,
    ) -> Future<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> R + 'static,
        G: FnOnce(E) -> S + 'static,
        R: IntoResolution<U, E>,
        S: IntoResolution<U, E>,
    {
        self.chain(move |outcome| {
            let resolution = match outcome {
                Ok(value) => on_resolved(value).into_resolution(),
                Err(reason) => on_rejected(reason).into_resolution(),
            };
            (resolution, Delivery::Handled)
        })
    }

    /// Reacts to a rejection. Values pass through untouched.
    pub fn catch<G, S>(&self, on_rejected: G) -> Self
    where
        G: FnOnce(E) -> S + 'static,
        S: IntoResolution<T, E>,
    {
        self.chain(move |outcome| match outcome {
            Ok(value) => (Resolution::Value(value), Delivery::Forwarded),
            Err(reason) => {
                (on_rejected(reason).into_resolution(), Delivery::Handled)
            }
        })
    }

    /// Alias of [`catch`](Self::catch).
    pub fn fail<G, S>(&self, on_rejected: G) -> Self
    where
        G: FnOnce(E) -> S + 'static,
        S: IntoResolution<T, E>,
    {
        self.catch(on_rejected)
    }

    /// `then(on_resolved)` followed by `catch(on_rejected)`, so the
    /// rejection handler also sees failures of `on_resolved`.
    pub fn attempt<U, F, G, R, S>(
        &self,
        on_resolved: F,
        on_rejected: G,
    ) -> Future<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> R + 'static,
        G: FnOnce(E) -> S + 'static,
        R: IntoResolution<U, E>,
        S: IntoResolution<U, E>,
    {
        self.then(on_resolved).catch(on_rejected)
    }

    /// Reacts to the whole outcome.
    pub fn handle<U, F, R>(&self, on_settled: F) -> Future<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(Result<T, E>) -> R + 'static,
        R: IntoResolution<U, E>,
    {
        self.chain(move |outcome| {
            (on_settled(outcome).into_resolution(), Delivery::Handled)
        })
    }

    /// A new future with the same outcome, delivered on a later turn.
    pub fn forward(&self) -> Self {
        self.chain(|outcome| (outcome.into_resolution(), Delivery::Forwarded))
    }

    /// Observes the outcome without counting as a handler.
    pub fn watch(&self, observer: impl FnOnce(Result<T, E>) + 'static) {
        self.register(Box::new(move |outcome| {
            observer(outcome);
            Delivery::Forwarded
        }));
    }

    /// Runs `on_settled` on either branch and waits for what it returns.
    ///
    /// The returned future keeps the original value or reason, unless the
    /// cleanup itself fails, in which case that failure wins.
    pub fn finally<F, R, X>(&self, on_settled: F) -> Self
    where
        F: FnOnce() -> R + 'static,
        R: IntoResolution<X, E>,
        X: Clone + 'static,
    {
        self.chain(move |outcome| {
            let cleanup = Future::<X, E>::from_resolution(on_settled());
            let restored = cleanup.chain(move |done| {
                let resolution = match done {
                    Ok(_) => outcome.into_resolution(),
                    Err(reason) => Resolution::Error(reason),
                };
                (resolution, Delivery::Handled)
            });
            (Resolution::adopt(restored), Delivery::Handled)
        })
    }

    /// Alias of [`finally`](Self::finally).
    pub fn lastly<F, R, X>(&self, on_settled: F) -> Self
    where
        F: FnOnce() -> R + 'static,
        R: IntoResolution<X, E>,
        X: Clone + 'static,
    {
        self.finally(on_settled)
    }

    /// Bridges to an error-first callback.
    ///
    /// On success `callback(None, Some(value))` runs, on failure
    /// `callback(Some(reason), None)`. The returned future carries the
    /// original outcome. Without a callback this is [`forward`](Self::forward).
    pub fn callback<F>(&self, callback: Option<F>) -> Self
    where
        F: FnOnce(Option<E>, Option<T>) + 'static,
    {
        let Some(callback) = callback else {
            return self.forward();
        };
        self.chain(move |outcome| {
            match &outcome {
                Ok(value) => callback(None, Some(value.clone())),
                Err(reason) => callback(Some(reason.clone()), None),
            }
            (outcome.into_resolution(), Delivery::Handled)
        })
    }

    /// A new future settling the same way, `duration` after this one.
    pub fn delay(&self, duration: Duration) -> Self {
        self.chain(move |outcome| {
            let (delayed, resolver) = Self::pending();
            task::spawn_after(duration, move || resolver.settle(outcome));
            (Resolution::adopt(delayed), Delivery::Handled)
        })
    }

    /// Cancels the future.
    ///
    /// The state becomes [`State::Canceled`], queued and future reactions
    /// are dropped and the cancellation hook runs once. Futures derived
    /// through reactions stay pending forever.
    pub fn cancel(&self) {
        let (hook, reactions) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == State::Canceled {
                return;
            }
            inner.state = State::Canceled;
            (inner.on_cancel.take(), mem::take(&mut inner.reactions))
        };
        debug!(
            hooked = hook.is_some(),
            dropped = reactions.len(),
            "future canceled"
        );
        drop(reactions);
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Registers a progress listener. Returns the same future for chaining.
    pub fn on_notify<F>(&self, listener: F) -> Self
    where
        F: Fn(&Progress) -> Result<(), E> + 'static,
    {
        self.inner.borrow_mut().listeners.push(Rc::new(listener));
        self.clone()
    }

    /// Alias of [`on_notify`](Self::on_notify).
    pub fn progress<F>(&self, listener: F) -> Self
    where
        F: Fn(&Progress) -> Result<(), E> + 'static,
    {
        self.on_notify(listener)
    }
}

impl<T, E> Thenable<T, E> for Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    fn then(self: Box<Self>, resolver: Resolver<T, E>) -> Result<(), E> {
        self.register(Box::new(move |outcome| {
            resolver.settle(outcome);
            Delivery::Forwarded
        }));
        Ok(())
    }
}
