/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The single chokepoint through which all outbound engine method calls pass.

use gdbind_ffi as sys;
use sys::{interface_fn, CallFrame, ClassMethod, ReturnMeta};

use crate::meta::CallContext;

/// Calls `method` on `receiver` with the arguments and return slot of `frame`.
///
/// Passes the frame's argument pointers in declared order and its pre-sized return slot, invokes the engine exactly
/// once and records the method's return ownership in the frame. Decoding is left to [`CallFrame::get()`].
///
/// # Safety
/// `receiver` must be a live object of `method`'s class (or null for static methods), and the frame's arguments and
/// return slot must match the method's signature.
pub unsafe fn ptrcall(method: &ClassMethod, receiver: sys::GDExtensionObjectPtr, frame: &mut CallFrame<'_>) {
    sys::out!("ptrcall {} ({} args)", CallContext::outbound(method), frame.arity());

    let args = frame.sys_args();
    let ret = frame.sys_ret();

    interface_fn!(object_method_bind_ptrcall)(method.bind.sys(), receiver, args.as_ptr(), ret);

    frame.mark_returned(ReturnMeta {
        ownership: method.ownership,
        receiver,
    });
}
