/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Outbound call helpers used by engine-class façades.

use gdbind_ffi as sys;
use sys::{CallFrame, ClassMethod, FrameRet};

use crate::meta::dispatch;

/// Performs one complete outbound class-method call: frame, arguments, dispatch, decoded return value.
///
/// `push` writes exactly `arity` arguments. The frame and all its temporaries are released before returning, also
/// when `push` or the engine call panics.
///
/// # Safety
/// `receiver` must be a live object of `method`'s class, and the arguments written by `push` as well as `R` must
/// match the method's signature.
pub unsafe fn out_class_ptrcall<'a, R: FrameRet>(
    method: &ClassMethod,
    receiver: sys::GDExtensionObjectPtr,
    arity: usize,
    push: impl FnOnce(&mut CallFrame<'a>),
) -> R {
    let mut frame = CallFrame::new(arity);
    push(&mut frame);

    let ret = frame.ret::<R>();
    dispatch::ptrcall(method, receiver, &mut frame);

    let result = frame.get(ret);
    frame.free();
    result
}
