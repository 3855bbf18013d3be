//! Uniform walking over item sources.
//!
//! Anything `IntoIterator` is a source: collections, arrays and live
//! iterators. [`generate`] adds lazily-started sources built by a factory.

/// A source whose items come from a factory run when the walk starts.
#[must_use = "sources do nothing unless walked"]
pub struct Generate<F> {
    factory: F,
}

/// Defers `factory` until the source is walked.
pub fn generate<F, I>(factory: F) -> Generate<F>
where
    F: FnOnce() -> I,
    I: IntoIterator,
{
    Generate { factory }
}

impl<F> std::fmt::Debug for Generate<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generate").finish()
    }
}

impl<F, I> IntoIterator for Generate<F>
where
    F: FnOnce() -> I,
    I: IntoIterator,
{
    type Item = I::Item;
    type IntoIter = I::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        (self.factory)().into_iter()
    }
}

/// What a walk saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Empty,
    Visited(usize),
}

impl Walk {
    pub fn count(self) -> usize {
        match self {
            Walk::Empty => 0,
            Walk::Visited(count) => count,
        }
    }
}

/// Calls `each(index, item)` for every item until the source is exhausted.
pub fn walk<I>(source: I, each: impl FnMut(usize, I::Item)) -> Walk
where
    I: IntoIterator,
{
    walk_while(source, || true, each)
}

/// Like [`walk`], but stops pulling items once `keep_going` returns false.
pub fn walk_while<I>(
    source: I,
    mut keep_going: impl FnMut() -> bool,
    mut each: impl FnMut(usize, I::Item),
) -> Walk
where
    I: IntoIterator,
{
    let mut source = source.into_iter();
    let mut visited = 0;
    while keep_going() {
        let Some(item) = source.next() else { break };
        each(visited, item);
        visited += 1;
    }
    match visited {
        0 => Walk::Empty,
        count => Walk::Visited(count),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    #[test]
    fn walks_collections_in_order() {
        let mut seen = Vec::new();
        let walked = walk(vec!['a', 'b', 'c'], |index, item| {
            seen.push((index, item))
        });
        assert_eq!(walked, Walk::Visited(3));
        assert_eq!(seen, [(0, 'a'), (1, 'b'), (2, 'c')]);
    }

    #[test]
    fn empty_sources_report_empty() {
        assert_eq!(walk(Vec::<u8>::new(), |_, _| {}), Walk::Empty);
        assert_eq!(walk(generate(|| 0..0), |_, _| {}), Walk::Empty);
        assert_eq!(Walk::Empty.count(), 0);
    }

    #[test]
    fn live_iterators_are_sources() {
        let mut total = 0;
        let walked = walk((1..=4).map(|n| n * n), |_, item| total += item);
        assert_eq!(walked.count(), 4);
        assert_eq!(total, 30);
    }

    #[test]
    fn generator_factory_runs_lazily() {
        let started = Cell::new(false);
        let source = generate(|| {
            started.set(true);
            ["x", "y"]
        });
        assert!(!started.get());
        let mut seen = Vec::new();
        walk(source, |_, item| seen.push(item));
        assert!(started.get());
        assert_eq!(seen, ["x", "y"]);
    }

    #[test]
    fn walk_while_stops_pulling() {
        let pulled = Cell::new(0);
        let source = (0..10).inspect(|_| pulled.set(pulled.get() + 1));
        let seen = RefCell::new(Vec::new());
        let walked = walk_while(
            source,
            || seen.borrow().len() < 3,
            |_, item| seen.borrow_mut().push(item),
        );
        assert_eq!(walked, Walk::Visited(3));
        assert_eq!(*seen.borrow(), [0, 1, 2]);
        assert_eq!(pulled.get(), 3);
    }
}
