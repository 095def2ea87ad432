/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Printing and logging functionality.

// https://stackoverflow.com/a/40234666
#[macro_export]
#[doc(hidden)]
macro_rules! inner_function {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        match name.strip_suffix("::f") {
            Some(stripped) => stripped,
            None => name,
        }
    }};
}

#[macro_export]
#[doc(hidden)]
macro_rules! inner_godot_msg {
    ($engine_fn:ident; $fmt:literal $(, $args:expr)* $(,)?) => {
        {
            let msg = format!("{}\0", format_args!($fmt $(, $args)*));

            // Check whether the binding is loaded, otherwise fall back to stderr.
            if $crate::sys::is_initialized() {
                let function = format!("{}\0", $crate::inner_function!());

                // SAFETY: all strings are nul-terminated and live for the duration of the call.
                unsafe {
                    $crate::sys::interface_fn!($engine_fn)(
                        $crate::sys::c_str(msg.as_bytes()),
                        $crate::sys::c_str(function.as_bytes()),
                        $crate::sys::c_str(concat!(file!(), "\0").as_bytes()),
                        line!() as i32,
                        $crate::sys::conv::SYS_FALSE, // whether to create a toast notification in editor
                    );
                }
            } else {
                eprintln!("[{}] {}", stringify!($engine_fn), &msg[..msg.len() - 1]);
            }
        }
    };
}

/// Pushes a warning message to the engine's debugger and to the OS terminal.
#[macro_export]
macro_rules! godot_warn {
    ($fmt:literal $(, $args:expr)* $(,)?) => {
        $crate::inner_godot_msg!(print_warning; $fmt $(, $args)*)
    };
}

/// Pushes an error message to the engine's debugger and to the OS terminal.
#[macro_export]
macro_rules! godot_error {
    ($fmt:literal $(, $args:expr)* $(,)?) => {
        $crate::inner_godot_msg!(print_error; $fmt $(, $args)*)
    };
}

/// Prints to the console.
///
/// The C interface has no plain print function, so messages go to stdout.
#[macro_export]
macro_rules! godot_print {
    ($fmt:literal $(, $args:expr)* $(,)?) => {
        println!($fmt $(, $args)*)
    };
}

pub use crate::{godot_error, godot_print, godot_warn};
