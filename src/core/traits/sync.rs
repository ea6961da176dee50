//! Synchronized state abstraction for platform-agnostic state access.
//!
//! This module provides the `SharedState` trait that abstracts over different
//! synchronization mechanisms (Embassy critical-section Mutex, RefCell for
//! host builds) to enable host testing without embedded dependencies.
//!
//! Every component with mutable state reachable from bus handlers wraps that
//! state in [`ModuleState`] and follows one rule: the closure passed to
//! `with`/`with_mut` never publishes on the bus and never calls back into the
//! same state. Snapshot inside the lock, act outside it.

/// Platform-agnostic synchronized state access.
///
/// Implementations:
/// - `EmbassyState<T>` for embedded targets using Embassy's critical-section
///   Mutex (feature `embassy`)
/// - `MockState<T>` for host builds using RefCell (single-threaded)
pub trait SharedState<T> {
    /// Access state immutably.
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R;

    /// Access state mutably.
    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R;
}

/// The state wrapper modules actually use, selected by feature.
#[cfg(feature = "embassy")]
pub type ModuleState<T> = EmbassyState<T>;

/// The state wrapper modules actually use, selected by feature.
#[cfg(not(feature = "embassy"))]
pub type ModuleState<T> = MockState<T>;

// ============================================================================
// Embassy Implementation
// ============================================================================

#[cfg(feature = "embassy")]
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

/// Embassy-based synchronized state using a critical-section Mutex.
///
/// The critical section ensures atomic access even when the holding context
/// can be preempted, making this safe for state shared between tasks on one
/// core.
#[cfg(feature = "embassy")]
pub struct EmbassyState<T> {
    inner: Mutex<CriticalSectionRawMutex, core::cell::RefCell<T>>,
}

#[cfg(feature = "embassy")]
impl<T> EmbassyState<T> {
    /// Creates a new `EmbassyState` wrapping the given value.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(core::cell::RefCell::new(value)),
        }
    }

    /// Consumes the wrapper, returning the inner value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner().into_inner()
    }
}

#[cfg(feature = "embassy")]
impl<T> SharedState<T> for EmbassyState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        self.inner.lock(|cell| f(&cell.borrow()))
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

// ============================================================================
// Mock Implementation (always available)
// ============================================================================

/// RefCell-based synchronized state for single-threaded host use.
///
/// # Panics
///
/// Panics if borrowing rules are violated (e.g. calling `with_mut` from
/// inside a `with` closure on the same state). That indicates a handler
/// publishing while holding its own lock, which the dispatch discipline
/// forbids.
pub struct MockState<T> {
    inner: core::cell::RefCell<T>,
}

impl<T> MockState<T> {
    /// Creates a new `MockState` wrapping the given value.
    pub const fn new(value: T) -> Self {
        Self {
            inner: core::cell::RefCell::new(value),
        }
    }

    /// Consumes the wrapper, returning the inner value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T> SharedState<T> for MockState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.inner.borrow())
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        f(&mut self.inner.borrow_mut())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_state_read_write() {
        let state = MockState::new(0u32);
        state.with_mut(|v| *v = 100);
        assert_eq!(state.with(|v| *v), 100);
    }

    #[test]
    fn mock_state_with_struct() {
        #[derive(Default)]
        struct Inner {
            counter: u32,
            name: &'static str,
        }

        let state = MockState::new(Inner {
            counter: 0,
            name: "idle",
        });

        state.with_mut(|s| {
            s.counter = 5;
            s.name = "running";
        });

        assert_eq!(state.with(|s| s.counter), 5);
        assert_eq!(state.with(|s| s.name), "running");
    }

    #[test]
    fn mock_state_closure_return_value() {
        let state = MockState::new([1u32, 2, 3]);
        let sum: u32 = state.with(|v| v.iter().sum());
        assert_eq!(sum, 6);
    }

    #[test]
    #[should_panic(expected = "already borrowed")]
    fn mock_state_double_borrow_panics() {
        let state = MockState::new(0u32);

        state.with(|_v| {
            let _ = state.inner.borrow_mut();
        });
    }
}
