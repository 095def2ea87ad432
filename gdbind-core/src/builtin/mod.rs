/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Built-in types like `Vector2`, `GString` and `Variant`.
//!
//! Plain-old-data types (`Vector2`, `Vector3`, `Color`) are passed by value. Payload types (`GString`, `StringName`,
//! `Variant`, `Array`, `Dictionary`) wrap an opaque native value together with its [`Ownership`](crate::handle::Ownership)
//! and are passed to calls by reference.

mod macros;

mod array;
mod color;
mod dictionary;
mod string;
mod string_name;
mod variant;
mod vectors;

pub use array::Array;
pub use color::Color;
pub use dictionary::Dictionary;
pub use string::GString;
pub use string_name::StringName;
pub use variant::{FromGodot, ToGodot, Variant, VariantType};
pub use vectors::{Vector2, Vector3};
