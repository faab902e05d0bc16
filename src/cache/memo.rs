//! Memoized Cell Module
//!
//! Single-shot value holder used by [`ConcurrentCache`](super::ConcurrentCache).

use once_cell::sync::OnceCell;

// == Memoized ==
/// A value computed at most once and then shared by every reader.
///
/// Concurrent initializers block on the first one; if its computation
/// panics the cell stays empty and the next initializer takes over.
#[derive(Debug)]
pub(crate) struct Memoized<V> {
    cell: OnceCell<V>,
}

impl<V> Memoized<V> {
    /// Creates a cell whose value is produced by the first initializer.
    pub(crate) fn pending() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Creates a cell that already holds `value`.
    pub(crate) fn ready(value: V) -> Self {
        Self {
            cell: OnceCell::with_value(value),
        }
    }

    /// Returns the value, running `init` if nobody has produced it yet.
    pub(crate) fn get_or_init<F>(&self, init: F) -> &V
    where
        F: FnOnce() -> V,
    {
        self.cell.get_or_init(init)
    }

    /// Returns the value without blocking. `None` while still computing.
    pub(crate) fn get(&self) -> Option<&V> {
        self.cell.get()
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }
}
