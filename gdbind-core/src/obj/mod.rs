/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Types and traits related to objects.
//!
//! The most important symbol in this module is [`Gd`], which is the smart pointer used to reference engine objects.

mod base;
mod gd;
mod guards;
mod instance_id;
mod traits;

pub use base::Base;
pub use gd::Gd;
pub use guards::{BaseMut, GdMut, GdRef};
pub use instance_id::InstanceId;
pub use traits::*;

pub(crate) use gd::{class_tag, is_ref_counted_object};
