/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Ownership state shared by all handles.
//!
//! Every handle to a native object or payload carries exactly one [`Ownership`]. It decides whether dropping the handle
//! releases the native resource:
//!
//! | Operation             | Rust API                                                      |
//! |-----------------------|---------------------------------------------------------------|
//! | borrow for a call     | `frame.arg(&handle)`, `handle.sys()`                          |
//! | release               | `Drop` of an owned payload or reference, `Gd::free()`         |
//! | take ownership        | `from_sys_owned()`, constructors such as `GString::from()`    |
//! | wrap as borrowed      | `from_sys_borrowed()`, `Gd::from_obj_sys_borrowed()`          |
//! | bind to a parent      | `Gd::from_obj_sys_bound()`                                    |

pub mod audit;

use std::fmt;

use crate::obj::InstanceId;

/// Who is responsible for releasing the native resource behind a handle.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Ownership {
    /// The engine or another handle owns the resource. Releasing is a no-op.
    Borrowed,

    /// This handle releases the resource exactly once.
    Owned,

    /// The resource lives as long as the parent object with the given ID. Releasing is a no-op.
    BoundTo(InstanceId),
}

impl Ownership {
    pub fn is_owned(self) -> bool {
        matches!(self, Self::Owned)
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Borrowed => f.write_str("borrowed"),
            Self::Owned => f.write_str("owned"),
            Self::BoundTo(parent) => write!(f, "bound to {parent}"),
        }
    }
}

/// Kind of native resource, used to group audit counters.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub enum HandleKind {
    String,
    StringName,
    Variant,
    Array,
    Dictionary,
    Object,
}

/// Ownership of one handle together with its audit ticket.
#[derive(Debug)]
pub struct HandleState {
    ownership: Ownership,
    kind: HandleKind,
    ticket: audit::Ticket,
}

impl HandleState {
    /// State of a freshly acquired resource that this handle must release.
    pub fn owned(kind: HandleKind) -> Self {
        Self {
            ownership: Ownership::Owned,
            kind,
            ticket: audit::acquire(kind),
        }
    }

    pub fn borrowed(kind: HandleKind) -> Self {
        Self::with(kind, Ownership::Borrowed)
    }

    /// State for an arbitrary ownership; `Owned` acquires an audit ticket.
    pub fn with(kind: HandleKind, ownership: Ownership) -> Self {
        match ownership {
            Ownership::Owned => Self::owned(kind),
            _ => Self {
                ownership,
                kind,
                ticket: audit::Ticket::none(),
            },
        }
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    pub fn is_owned(&self) -> bool {
        self.ownership.is_owned()
    }

    /// Marks the resource released. Returns whether the caller must actually release the native resource, i.e.
    /// whether the handle was owned.
    ///
    /// The state becomes borrowed, so a second call is a no-op.
    pub fn release(&mut self) -> bool {
        if !self.ownership.is_owned() {
            return false;
        }

        let ticket = std::mem::replace(&mut self.ticket, audit::Ticket::none());
        audit::release(self.kind, ticket);
        self.ownership = Ownership::Borrowed;
        true
    }
}
