//! Per-kind admission control.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rotor_core::{ResourceKind, SessionId};
use std::sync::Arc;

/// Tracks which resource kinds have a rotation in flight.
///
/// Owned by the server and shared by every service. Acquisition never
/// blocks: a busy kind is refused immediately.
#[derive(Debug, Clone, Default)]
pub struct GuardRegistry {
    held: Arc<DashMap<ResourceKind, SessionId>>,
}

impl GuardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `kind` for `session`, or `None` if another session holds it.
    pub fn try_acquire(&self, kind: ResourceKind, session: SessionId) -> Option<SessionGuard> {
        match self.held.entry(kind) {
            Entry::Occupied(holder) => {
                tracing::warn!(
                    kind = %kind,
                    session = %session,
                    holder = %holder.get(),
                    "rotation already in progress"
                );
                None
            }
            Entry::Vacant(slot) => {
                slot.insert(session);
                Some(SessionGuard {
                    held: Arc::clone(&self.held),
                    kind,
                    session,
                })
            }
        }
    }

    pub fn is_held(&self, kind: ResourceKind) -> bool {
        self.held.contains_key(&kind)
    }

    /// Session currently holding `kind`.
    pub fn holder(&self, kind: ResourceKind) -> Option<SessionId> {
        self.held.get(&kind).map(|s| *s)
    }
}

/// Releases its kind when dropped.
#[derive(Debug)]
pub struct SessionGuard {
    held: Arc<DashMap<ResourceKind, SessionId>>,
    kind: ResourceKind,
    session: SessionId,
}

impl SessionGuard {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn session(&self) -> SessionId {
        self.session
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let session = self.session;
        self.held.remove_if(&self.kind, |_, holder| *holder == session);
        tracing::trace!(kind = %self.kind, session = %session, "guard released");
    }
}
