/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Lazily initialized, mutable global.
///
/// Features a `const` constructor usable in `static` items, the initialization function given once at declaration,
/// and guard access to both `&T` and `&mut T`. Used for the method-bind resolution cache and handle audit counters.
pub struct Global<T> {
    value: Mutex<InitState<T>>,
}

impl<T> Global<T> {
    /// The initialization function is only called once, when the global is first accessed through [`lock()`](Self::lock).
    pub const fn new(init_fn: fn() -> T) -> Self {
        Self {
            value: Mutex::new(InitState::Pending(init_fn)),
        }
    }

    /// Inherent rather than `Default` impl, because the latter is not `const`.
    pub const fn default() -> Self
    where
        T: Default,
    {
        Self::new(T::default)
    }

    /// Returns a guard that gives shared or mutable access to the value.
    ///
    /// # Panics
    /// If the initialization function panics. The global then stays failed and all future calls panic.
    pub fn lock(&self) -> GlobalGuard<'_, T> {
        GlobalGuard {
            guard: self.ensure_init(),
        }
    }

    fn ensure_init(&self) -> MutexGuard<'_, InitState<T>> {
        // A panic while holding the guard (e.g. a failed audit assertion) must not take every later access down with it.
        let mut guard = self.value.lock().unwrap_or_else(PoisonError::into_inner);

        let init_fn = match &*guard {
            InitState::Initialized(_) => return guard,
            InitState::Failed => panic!("previous Global<T> initialization failed due to panic"),
            InitState::Pending(init_fn) => *init_fn,
        };

        *guard = InitState::Failed;
        let value = init_fn();
        *guard = InitState::Initialized(value);

        guard
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Guards

/// Guard that temporarily gives access to a `Global<T>`'s inner value.
pub struct GlobalGuard<'a, T> {
    guard: MutexGuard<'a, InitState<T>>,
}

impl<T> Deref for GlobalGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match &*self.guard {
            InitState::Initialized(value) => value,
            _ => unreachable!("guard is only handed out in initialized state"),
        }
    }
}

impl<T> DerefMut for GlobalGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut *self.guard {
            InitState::Initialized(value) => value,
            _ => unreachable!("guard is only handed out in initialized state"),
        }
    }
}

enum InitState<T> {
    Initialized(T),
    Pending(fn() -> T),
    Failed,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Write-once cells

/// Global that is written exactly once during startup and read-only afterwards.
///
/// Initializing twice, or reading before initialization, is a programming error and panics with the cell's name.
/// Reads are lock-free.
pub struct InitCell<T> {
    name: &'static str,
    value: OnceLock<T>,
}

impl<T> InitCell<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            value: OnceLock::new(),
        }
    }

    /// Stores the value; the cell is frozen afterwards.
    ///
    /// # Panics
    /// If the cell has already been initialized.
    pub fn initialize(&self, value: T) {
        if self.value.set(value).is_err() {
            panic!("{} initialized twice; initialize must only be called once", self.name);
        }
    }

    /// # Panics
    /// If the cell has not been initialized yet.
    pub fn get(&self) -> &T {
        match self.value.get() {
            Some(value) => value,
            None => panic!("{} queried before initialization", self.name),
        }
    }

    pub fn try_get(&self) -> Option<&T> {
        self.value.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.value.get().is_some()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    static MAP: Global<HashMap<i32, &'static str>> = Global::default();
    static VEC: Global<Vec<i32>> = Global::new(|| vec![1, 2, 3]);

    #[test]
    fn test_global_map() {
        {
            let mut map = MAP.lock();
            map.insert(2, "two");
            map.insert(3, "three");
        }

        {
            let mut map = MAP.lock();
            map.insert(1, "one");
        }

        let map = MAP.lock();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&1), Some(&"one"));
        assert_eq!(map.get(&3), Some(&"three"));
    }

    #[test]
    fn test_global_vec() {
        VEC.lock().push(4);

        let vec = VEC.lock();
        assert_eq!(*vec, &[1, 2, 3, 4]);
    }

    #[test]
    fn init_cell_frozen_after_initialize() {
        let cell = InitCell::new("class registry");
        assert!(!cell.is_initialized());
        assert!(cell.try_get().is_none());

        cell.initialize(7);
        assert_eq!(*cell.get(), 7);
        assert_eq!(cell.name(), "class registry");
    }

    #[test]
    #[should_panic(expected = "class registry initialized twice")]
    fn init_cell_double_initialize_panics() {
        let cell = InitCell::new("class registry");
        cell.initialize(1);
        cell.initialize(2);
    }

    #[test]
    #[should_panic(expected = "method table for Node queried before initialization")]
    fn init_cell_query_before_init_panics() {
        let cell = InitCell::<u32>::new("method table for Node");
        cell.get();
    }
}
