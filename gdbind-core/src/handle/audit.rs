/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Instrumentation of owned handles.
//!
//! With the `trace` feature, every owned handle receives a unique ticket on acquisition, and releasing checks that the
//! ticket is still live. This turns a double release into a panic and makes leaks countable. Without the feature,
//! tickets are zero-sized and all functions compile to nothing.

use std::collections::BTreeMap;
use std::fmt;

use super::HandleKind;

/// Acquisition and release counts since process start.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct AuditSnapshot {
    pub acquired: u64,
    pub released: u64,
    pub live_by_kind: BTreeMap<HandleKind, u64>,
}

impl AuditSnapshot {
    /// Number of handles acquired but not yet released.
    pub fn live(&self) -> u64 {
        self.acquired - self.released
    }

    /// Counts accumulated between `earlier` and `self`.
    pub fn since(&self, earlier: &AuditSnapshot) -> AuditSnapshot {
        let mut live_by_kind = BTreeMap::new();
        for (kind, &count) in &self.live_by_kind {
            let before = earlier.live_by_kind.get(kind).copied().unwrap_or(0);
            if count != before {
                live_by_kind.insert(*kind, count.saturating_sub(before));
            }
        }

        AuditSnapshot {
            acquired: self.acquired - earlier.acquired,
            released: self.released - earlier.released,
            live_by_kind,
        }
    }
}

impl fmt::Display for AuditSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} acquired, {} released, {} live",
            self.acquired,
            self.released,
            self.live()
        )?;

        for (kind, count) in self.live_by_kind.iter().filter(|(_, count)| **count > 0) {
            write!(f, "\n  {kind:?}: {count}")?;
        }
        Ok(())
    }
}

#[cfg(feature = "trace")]
mod imp {
    use std::collections::{BTreeMap, HashSet};
    use std::num::NonZeroU64;

    use super::{AuditSnapshot, HandleKind};
    use crate::sys::Global;

    #[derive(Debug, Eq, PartialEq)]
    pub struct Ticket(pub(super) Option<NonZeroU64>);

    impl Ticket {
        pub fn none() -> Self {
            Self(None)
        }
    }

    #[derive(Default)]
    struct AuditState {
        next_id: u64,
        live: HashSet<NonZeroU64>,
        acquired: u64,
        released: u64,
        live_by_kind: BTreeMap<HandleKind, u64>,
    }

    static AUDIT: Global<AuditState> = Global::default();

    pub fn acquire(kind: HandleKind) -> Ticket {
        let mut state = AUDIT.lock();
        state.next_id += 1;

        let id = NonZeroU64::new(state.next_id);
        state.live.extend(id);
        state.acquired += 1;
        *state.live_by_kind.entry(kind).or_default() += 1;

        Ticket(id)
    }

    pub fn release(kind: HandleKind, ticket: Ticket) {
        let Some(id) = ticket.0 else {
            return;
        };

        let mut state = AUDIT.lock();
        if !state.live.remove(&id) {
            drop(state);
            panic!("handle {id} of kind {kind:?} released twice");
        }

        state.released += 1;
        if let Some(count) = state.live_by_kind.get_mut(&kind) {
            *count = count.saturating_sub(1);
        }
    }

    pub fn snapshot() -> AuditSnapshot {
        let state = AUDIT.lock();

        AuditSnapshot {
            acquired: state.acquired,
            released: state.released,
            live_by_kind: state.live_by_kind.clone(),
        }
    }

    pub fn is_enabled() -> bool {
        true
    }
}

#[cfg(not(feature = "trace"))]
mod imp {
    use super::{AuditSnapshot, HandleKind};

    #[derive(Debug, Eq, PartialEq)]
    pub struct Ticket;

    impl Ticket {
        pub fn none() -> Self {
            Self
        }
    }

    pub fn acquire(_kind: HandleKind) -> Ticket {
        Ticket
    }

    pub fn release(_kind: HandleKind, _ticket: Ticket) {}

    pub fn snapshot() -> AuditSnapshot {
        AuditSnapshot::default()
    }

    pub fn is_enabled() -> bool {
        false
    }
}

/// Proof of one acquisition. Owned by the handle, consumed on release.
pub use imp::Ticket;

/// Records the acquisition of an owned handle.
pub fn acquire(kind: HandleKind) -> Ticket {
    imp::acquire(kind)
}

/// Records the release of an owned handle.
///
/// # Panics
/// With the `trace` feature: if the ticket was already released.
pub fn release(kind: HandleKind, ticket: Ticket) {
    imp::release(kind, ticket)
}

/// Current counts. All zero without the `trace` feature.
pub fn snapshot() -> AuditSnapshot {
    imp::snapshot()
}

/// Whether handles are being counted.
pub fn is_enabled() -> bool {
    imp::is_enabled()
}

/// Prints the handles still alive, if any. Called when the library is unloaded.
pub(crate) fn report_leaks() {
    if !is_enabled() {
        return;
    }

    let snapshot = snapshot();
    if snapshot.live() > 0 {
        crate::godot_warn!("gdbind: {} handles still alive at shutdown ({snapshot})", snapshot.live());
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(all(test, feature = "trace"))]
mod tests {
    use super::*;

    // Other unit tests acquire handles concurrently, so only the own ticket's effect is checked.

    #[test]
    fn acquire_release_balances() {
        let ticket = acquire(HandleKind::Array);
        assert_ne!(ticket, Ticket::none());

        let before = snapshot();
        release(HandleKind::Array, ticket);
        let after = snapshot();

        assert!(after.released > before.released);
    }

    #[test]
    #[should_panic(expected = "released twice")]
    fn double_release_panics() {
        let ticket = acquire(HandleKind::String);
        let Ticket(id) = &ticket;
        let forged = Ticket(*id);

        release(HandleKind::String, ticket);
        release(HandleKind::String, forged);
    }

    #[test]
    fn none_ticket_is_ignored() {
        let before = snapshot().released;
        release(HandleKind::Object, Ticket::none());
        // Concurrent tests may release, but never fewer than before.
        assert!(snapshot().released >= before);
    }

    #[test]
    fn snapshot_difference() {
        let earlier = AuditSnapshot {
            acquired: 3,
            released: 1,
            live_by_kind: BTreeMap::from([(HandleKind::String, 2)]),
        };
        let later = AuditSnapshot {
            acquired: 5,
            released: 2,
            live_by_kind: BTreeMap::from([(HandleKind::String, 2), (HandleKind::Object, 1)]),
        };

        let diff = later.since(&earlier);
        assert_eq!(diff.acquired, 2);
        assert_eq!(diff.released, 1);
        assert_eq!(diff.live(), 1);
        assert_eq!(diff.live_by_kind, BTreeMap::from([(HandleKind::Object, 1)]));
    }
}
