/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Stores an opaque engine value of a certain size, with very restricted operations.
///
/// Due to `align(8)` and not `packed` repr, this type may be bigger than `N` bytes; the engine only needs to read and
/// write those `N` bytes reliably.
#[repr(C, align(8))]
#[derive(Copy, Clone)]
pub struct Opaque<const N: usize> {
    storage: [u8; N],
    marker: std::marker::PhantomData<*const u8>, // disable Send/Sync
}

impl<const N: usize> Opaque<N> {
    /// All-zero storage; only valid as a destination the engine initializes.
    pub const fn zeroed() -> Self {
        Self {
            storage: [0; N],
            marker: std::marker::PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_void {
        self.storage.as_ptr() as *const _
    }

    pub fn as_mut_ptr(&mut self) -> *mut std::ffi::c_void {
        self.storage.as_mut_ptr() as *mut _
    }
}

impl<const N: usize> std::fmt::Debug for Opaque<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Opaque<{N}>({:02x?})", &self.storage)
    }
}

#[cfg(test)]
mod tests {
    use super::Opaque;

    #[test]
    fn opaque_layout() {
        assert_eq!(std::mem::size_of::<Opaque<8>>(), 8);
        assert_eq!(std::mem::size_of::<Opaque<24>>(), 24);
        assert_eq!(std::mem::align_of::<Opaque<24>>(), 8);
    }

    #[test]
    fn opaque_pointers_alias_storage() {
        let mut opaque = Opaque::<8>::zeroed();
        let address = &opaque as *const _ as *const std::ffi::c_void;

        assert_eq!(opaque.as_ptr(), address);
        assert_eq!(opaque.as_mut_ptr() as *const _, address);
    }
}
