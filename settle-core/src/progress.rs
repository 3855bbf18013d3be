use std::{any::Any, fmt, rc::Rc};

/// A progress signal broadcast through [`Resolver::notify`].
///
/// Progress values are type-erased so a future's notification channel is
/// independent of its value type. Listeners downcast to the type they expect.
///
/// [`Resolver::notify`]: crate::Resolver::notify
#[derive(Clone)]
pub struct Progress(Rc<dyn Any>);

impl Progress {
    pub fn new<N: Any>(value: N) -> Self {
        Progress(Rc::new(value))
    }

    pub fn downcast_ref<N: Any>(&self) -> Option<&N> {
        let value: &dyn Any = &*self.0;
        value.downcast_ref()
    }

    pub fn is<N: Any>(&self) -> bool {
        self.downcast_ref::<N>().is_some()
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}
