/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Meta-information about calls and conversions: the call dispatcher, signatures, property descriptions and
//! conversion errors.

mod call_context;
mod convert_error;
mod godot_type;
mod property_info;

pub mod dispatch;
pub mod signature;

pub use call_context::CallContext;
pub use convert_error::ConvertError;
pub use godot_type::GodotType;
pub use property_info::PropertyInfo;
