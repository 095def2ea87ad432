/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Integration tests of gdbind against an in-process mock engine.
//!
//! The library under test is this crate itself: [`ItestLibrary`] is its `ExtensionLibrary`, and the tests in `tests/`
//! declare user classes next to it. [`boot()`] loads it into the [`mock`] engine like the engine would load a shared
//! library, and runs all initialization levels.

pub mod echo;
pub mod mock;

use std::sync::{Mutex, MutexGuard, OnceLock};

use gdbind::init::{gdextension, ExtensionLibrary, InitLevel};
use gdbind::registry::EngineClassInfo;

struct ItestLibrary;

#[gdextension]
unsafe impl ExtensionLibrary for ItestLibrary {
    fn min_level() -> InitLevel {
        InitLevel::Core
    }

    fn on_level_init(level: InitLevel) {
        record(LevelEvent::Init(level));
    }

    fn on_level_deinit(level: InitLevel) {
        record(LevelEvent::Deinit(level));
    }

    fn engine_classes() -> Vec<EngineClassInfo> {
        vec![echo::class_info()]
    }
}

/// Init-level hook invocation, in the order the library saw them.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LevelEvent {
    Init(InitLevel),
    Deinit(InitLevel),
}

static LEVEL_EVENTS: Mutex<Vec<LevelEvent>> = Mutex::new(Vec::new());

fn record(event: LevelEvent) {
    LEVEL_EVENTS.lock().unwrap_or_else(|e| e.into_inner()).push(event);
}

pub fn level_events() -> Vec<LevelEvent> {
    LEVEL_EVENTS.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Calls the library's entry point. Returns whether the library accepted to load.
pub fn try_boot() -> bool {
    mock::load_library(Some(gdext_rust_init))
}

/// Loads the library and initializes all levels, once per process.
pub fn boot() {
    static BOOTED: OnceLock<()> = OnceLock::new();

    BOOTED.get_or_init(|| {
        assert!(try_boot(), "library refused to load: {:?}", mock::errors());
        mock::initialize_levels(InitLevel::Editor);
    });
}

/// Serializes tests that compare global counters (handle audit, live native values).
pub fn serial() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());

    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Panics if the engine detected interface misuse.
pub fn assert_no_violations() {
    let violations = mock::violations();
    assert!(violations.is_empty(), "engine detected violations:\n  {}", violations.join("\n  "));
}
