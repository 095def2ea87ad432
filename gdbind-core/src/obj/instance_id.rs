/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::num::NonZeroU64;

use gdbind_ffi as sys;

/// Represents a non-zero instance ID.
///
/// This is its own type for clarity and type safety. Instance IDs are unique per object for the lifetime of the
/// process; an ID whose object was destroyed is never reused.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct InstanceId {
    // Note: in the engine, this is an u64 with its highest bit flagging reference-counted objects. We don't interpret it.
    value: NonZeroU64,
}

impl InstanceId {
    /// Constructs an instance ID from an integer, or `None` if the integer is zero.
    pub fn try_from_u64(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(|value| InstanceId { value })
    }

    /// ⚠️ Constructs an instance ID from a non-zero integer, or panics.
    ///
    /// # Panics
    /// If `id` is zero.
    pub fn from_u64(id: u64) -> Self {
        Self::try_from_u64(id).unwrap_or_else(|| panic!("expected non-zero instance ID"))
    }

    pub fn to_u64(self) -> u64 {
        self.value.get()
    }

    /// Instance ID of a live object.
    ///
    /// # Safety
    /// `obj` must point to a live object.
    pub(crate) unsafe fn of_object(obj: sys::GDExtensionConstObjectPtr) -> Option<Self> {
        let raw = sys::interface_fn!(object_get_instance_id)(obj);
        Self::try_from_u64(raw)
    }

    /// Whether an object with this ID is still alive.
    pub fn lookup_validity(self) -> bool {
        // SAFETY: querying an ID is allowed for any value.
        let obj = unsafe { sys::interface_fn!(object_get_instance_from_id)(self.to_u64()) };
        !obj.is_null()
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_u64())
    }
}

impl Debug for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "InstanceId({})", self.to_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::InstanceId;

    #[test]
    fn zero_is_not_an_id() {
        assert_eq!(InstanceId::try_from_u64(0), None);
        assert_eq!(InstanceId::try_from_u64(7).map(InstanceId::to_u64), Some(7));
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn from_zero_panics() {
        InstanceId::from_u64(0);
    }

    #[test]
    fn display() {
        assert_eq!(InstanceId::from_u64(42).to_string(), "42");
        assert_eq!(format!("{:?}", InstanceId::from_u64(42)), "InstanceId(42)");
    }
}
