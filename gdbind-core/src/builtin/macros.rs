/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Implements the handle protocol of an opaque payload type.
///
/// The type must be `#[repr(C)] struct { opaque: sys::OpaqueX, state: HandleState }`, so that a pointer to the struct
/// is also a pointer to the native value. Generates constructors, `Clone` (native copy), `Drop` (release if owned),
/// frame marshaling and `GodotFfi`.
macro_rules! impl_builtin_handle {
    (
        $Type:ident: $Opaque:ident, $kind:expr;
        default($d_dest:ident) => $default:expr,
        copy($c_dest:ident, $c_src:ident) => $copy:expr,
        destroy($x_ptr:ident) => $destroy:expr $(,)?
    ) => {
        impl $Type {
            /// Creates an owned handle, letting `init_fn` initialize the native value in place.
            #[doc(hidden)]
            pub unsafe fn new_with_uninit(init_fn: impl FnOnce(sys::GDExtensionUninitializedTypePtr)) -> Self {
                let mut opaque = sys::$Opaque::zeroed();
                init_fn(opaque.as_mut_ptr());

                Self {
                    opaque,
                    state: $crate::handle::HandleState::owned($kind),
                }
            }

            /// Takes over a native value. The caller gives up its responsibility to destroy it.
            ///
            /// # Safety
            /// `ptr` must point to an initialized native value that nobody else destroys.
            #[doc(hidden)]
            pub unsafe fn from_sys_owned(ptr: sys::GDExtensionConstTypePtr) -> Self {
                Self {
                    opaque: std::ptr::read(ptr as *const sys::$Opaque),
                    state: $crate::handle::HandleState::owned($kind),
                }
            }

            /// Wraps a native value owned elsewhere. Dropping the handle does not destroy it.
            ///
            /// # Safety
            /// `ptr` must point to an initialized native value that outlives the handle.
            #[doc(hidden)]
            pub unsafe fn from_sys_borrowed(ptr: sys::GDExtensionConstTypePtr) -> Self {
                Self {
                    opaque: std::ptr::read(ptr as *const sys::$Opaque),
                    state: $crate::handle::HandleState::borrowed($kind),
                }
            }

            #[doc(hidden)]
            pub fn sys(&self) -> sys::GDExtensionConstTypePtr {
                self.opaque.as_ptr()
            }

            #[doc(hidden)]
            pub fn sys_mut(&mut self) -> sys::GDExtensionTypePtr {
                self.opaque.as_mut_ptr()
            }

            /// Whether dropping this handle destroys the native value.
            pub fn ownership(&self) -> crate::handle::Ownership {
                self.state.ownership()
            }

            fn new_default() -> Self {
                // SAFETY: default constructor initializes the storage.
                unsafe { Self::new_with_uninit(|$d_dest| $default) }
            }
        }

        /// Native copy; the copy is always owned.
        impl Clone for $Type {
            fn clone(&self) -> Self {
                let $c_src = self.sys();

                // SAFETY: copy constructor initializes the storage from a live value.
                unsafe { Self::new_with_uninit(|$c_dest| $copy) }
            }
        }

        impl Drop for $Type {
            fn drop(&mut self) {
                if self.state.release() {
                    let $x_ptr = self.sys_mut();

                    // SAFETY: value is owned and was not destroyed before (release() returns true once).
                    unsafe { $destroy };
                }
            }
        }

        impl<'a> sys::FrameArg<'a> for &'a $Type {
            fn write_arg(self, frame: &mut sys::CallFrame<'a>) {
                frame.push_ref(self);
            }
        }

        impl sys::FrameRet for $Type {
            type Raw = Self;

            fn raw_default() -> Self {
                Self::new_default()
            }

            unsafe fn decode(raw: Self, _meta: &sys::ReturnMeta) -> Self {
                // The engine assigned into the owned default value, so it is already the result.
                raw
            }
        }

        // SAFETY: the struct starts with the opaque native value, and moving out swaps with the caller's slot.
        unsafe impl sys::GodotFfi for $Type {
            unsafe fn new_from_sys(ptr: sys::GDExtensionConstTypePtr) -> Self {
                let borrowed = std::mem::ManuallyDrop::new(Self::from_sys_borrowed(ptr));
                (*borrowed).clone()
            }

            fn sys(&self) -> sys::GDExtensionConstTypePtr {
                self.opaque.as_ptr()
            }

            unsafe fn move_return_ptr(mut self, dst: sys::GDExtensionTypePtr, _call_type: sys::PtrcallType) {
                // The slot holds an initialized value; swap it out and let `self` destroy it.
                std::ptr::swap(dst as *mut sys::$Opaque, &mut self.opaque);
            }
        }
    };
}

/// Implements frame marshaling and `GodotFfi` for plain-old-data builtins passed by value.
macro_rules! impl_builtin_pod {
    ($($Type:ident),* $(,)?) => {
        $(
            // SAFETY: #[repr(C)] struct with exactly the engine's layout.
            unsafe impl sys::GodotFfi for $Type {
                sys::ffi_methods! { type GDExtensionTypePtr = *mut Self; }
            }

            impl<'a> sys::FrameArg<'a> for $Type {
                fn write_arg(self, frame: &mut sys::CallFrame<'a>) {
                    frame.push_inline(self);
                }
            }

            impl sys::FrameRet for $Type {
                type Raw = Self;

                fn raw_default() -> Self {
                    Self::default()
                }

                unsafe fn decode(raw: Self, _meta: &sys::ReturnMeta) -> Self {
                    raw
                }
            }
        )*
    };
}

pub(crate) use {impl_builtin_handle, impl_builtin_pod};
