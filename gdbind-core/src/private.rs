/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Items used by generated code. Not part of the public API.

pub use crate::classes::class_macros;
pub use crate::engine_class;
pub use crate::obj::cap;
pub use crate::registry::callbacks;
pub use crate::registry::method::{ptrcall, varcall, ClassMethodInfo, MethodInstance, Receiver, VarcallArgs};
pub use crate::registry::plugin::{ClassPlugin, ErasedVirtualFn, ITraitImpl, InherentImpl, PluginItem, StructInfo};
pub use crate::registry::trampoline::{virtual_trampoline, Scope, ScopePhase, VirtualArgs};
pub use crate::storage::InstanceStorage;
pub use sys::out;

use std::cell::RefCell;
use std::io::Write;
use std::panic::{self, UnwindSafe};

use crate::log::godot_error;
use crate::sys;

sys::plugin_registry!(pub __GDBIND_PLUGIN_REGISTRY: ClassPlugin);

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Plugin handling

pub(crate) fn iterate_plugins(mut visitor: impl FnMut(&ClassPlugin)) {
    sys::plugin_foreach!(__GDBIND_PLUGIN_REGISTRY; |plugin: &ClassPlugin| visitor(plugin));
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Traits and types

// If someone forgets #[godot_api], this causes a compile error, rather than virtual functions not being called at runtime.
#[allow(non_camel_case_types)]
#[diagnostic::on_unimplemented(
    message = "`impl` blocks for engine interface traits require the `#[godot_api]` attribute",
    label = "missing `#[godot_api]` before `impl`"
)]
pub trait You_forgot_the_attribute__godot_api {}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Panic handling

#[derive(Debug)]
struct PanicLocation {
    line: u32,
    file: String,
}

thread_local! {
    // Filled by the panic hook; only read by the thread that caught the panic.
    static LAST_PANIC: RefCell<Option<PanicLocation>> = const { RefCell::new(None) };
}

pub fn extract_panic_message(err: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = err.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        format!("(panic of type ID {:?})", err.type_id())
    }
}

fn format_panic_message(msg: String) -> String {
    // If the message contains newlines, print all of the lines after a line break, and indent them.
    let lbegin = "\n  ";
    let indented = msg.replace('\n', lbegin);

    if indented.len() != msg.len() {
        format!("[panic]{lbegin}{indented}")
    } else {
        format!("[panic]  {msg}")
    }
}

pub fn flush_stdout() {
    // Nothing to report if stdout is gone.
    let _ = std::io::stdout().flush();
}

/// Executes `code`. If a panic is thrown, it is caught and an error message is printed to the engine.
///
/// Returns `Err(message)` if a panic occurred, and `Ok(result)` with the result of `code` otherwise. Must wrap every
/// entry point called by the engine, so that no panic unwinds across the C ABI.
pub fn handle_panic<E, F, R, S>(error_context: E, code: F) -> Result<R, String>
where
    E: FnOnce() -> S,
    F: FnOnce() -> R + UnwindSafe,
    S: std::fmt::Display,
{
    // Only record the panic location; the message itself is reported through godot_error! below.
    let prev_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info.location().map(|location| PanicLocation {
            file: location.file().to_string(),
            line: location.line(),
        });
        LAST_PANIC.with(|last| *last.borrow_mut() = location);
    }));

    let outcome = panic::catch_unwind(code);
    panic::set_hook(prev_hook);

    match outcome {
        Ok(result) => Ok(result),
        Err(err) => {
            // Flush, to make sure previous Rust output has been printed.
            flush_stdout();

            let location = LAST_PANIC
                .with(|last| last.borrow_mut().take())
                .map(|loc| format!("{}:{}", loc.file, loc.line))
                .unwrap_or_else(|| "<unknown location>".to_string());

            godot_error!("Rust function panicked at {}.\n  Context: {}", location, error_context());

            let msg = format_panic_message(extract_panic_message(err));
            godot_error!("{}", msg);

            Err(msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_is_caught_with_message() {
        let outcome = handle_panic(|| "Test::method", || -> i32 { panic!("boom") });
        assert_eq!(outcome, Err("[panic]  boom".to_string()));
    }

    #[test]
    fn success_passes_result() {
        assert_eq!(handle_panic(|| "Test::method", || 42), Ok(42));
    }

    #[test]
    fn multiline_message_is_indented() {
        assert_eq!(format_panic_message("a\nb".to_string()), "[panic]\n  a\n  b");
    }
}
