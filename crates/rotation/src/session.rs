//! Rotation session state.

use chrono::{DateTime, Utc};
use rotor_core::{ResourceKind, SessionId, Status};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of one rotation session.
///
/// ```text
/// Idle → Checkpointed → Accumulating → Committed
///            ↓    ↘          ↓
///            ↓      → Committed (bare Finalize)
///            → → → → Aborted ←
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No checkpoint yet.
    Idle,
    /// Guard held and checkpoint taken, nothing applied.
    Checkpointed,
    /// At least one change applied.
    Accumulating,
    Committed,
    Aborted,
}

impl SessionPhase {
    pub fn can_transition_to(&self, target: SessionPhase) -> bool {
        use SessionPhase::*;

        match (self, target) {
            (Idle, Checkpointed) => true,
            (Checkpointed, Accumulating) => true,
            (Accumulating, Accumulating) => true,
            (Checkpointed, Committed) => true,
            (Accumulating, Committed) => true,
            (Checkpointed, Aborted) => true,
            (Accumulating, Aborted) => true,

            (Committed, _) => false,
            (Aborted, _) => false,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Committed | SessionPhase::Aborted)
    }

    /// True while a checkpoint is outstanding.
    pub fn holds_checkpoint(&self) -> bool {
        matches!(self, SessionPhase::Checkpointed | SessionPhase::Accumulating)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Checkpointed => "checkpointed",
            SessionPhase::Accumulating => "accumulating",
            SessionPhase::Committed => "committed",
            SessionPhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// One Rotate stream's transaction.
#[derive(Debug, Clone)]
pub struct RotationSession {
    pub id: SessionId,
    pub kind: ResourceKind,
    pub started_at: DateTime<Utc>,
    /// Description of the checkpoint handle, once taken.
    pub checkpoint: Option<String>,
    pub phase: SessionPhase,
    /// Number of changes applied so far.
    pub staged: usize,
}

impl RotationSession {
    pub fn new(id: SessionId, kind: ResourceKind) -> Self {
        Self {
            id,
            kind,
            started_at: Utc::now(),
            checkpoint: None,
            phase: SessionPhase::Idle,
            staged: 0,
        }
    }

    /// Move to `target`. An illegal move is an engine bug and surfaces as
    /// `Internal`.
    pub fn advance(&mut self, target: SessionPhase) -> Result<(), Status> {
        if !self.phase.can_transition_to(target) {
            tracing::error!(
                session = %self.id,
                from = %self.phase,
                to = %target,
                "illegal session transition"
            );
            return Err(Status::internal(format!(
                "invalid session transition from {} to {target}",
                self.phase
            )));
        }
        tracing::trace!(session = %self.id, from = %self.phase, to = %target, "session transition");
        self.phase = target;
        Ok(())
    }

    /// End the session as aborted. Any open phase, `Idle` included, can
    /// abort; a session that already finished keeps its phase.
    pub fn mark_aborted(&mut self) {
        if self.phase.is_terminal() {
            tracing::debug!(session = %self.id, phase = %self.phase, "abort after session finished");
            return;
        }
        tracing::trace!(session = %self.id, from = %self.phase, "session aborted");
        self.phase = SessionPhase::Aborted;
    }

    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SessionPhase::Idle, SessionPhase::Checkpointed, true)]
    #[case(SessionPhase::Checkpointed, SessionPhase::Committed, true)]
    #[case(SessionPhase::Accumulating, SessionPhase::Accumulating, true)]
    #[case(SessionPhase::Accumulating, SessionPhase::Aborted, true)]
    #[case(SessionPhase::Idle, SessionPhase::Committed, false)]
    #[case(SessionPhase::Idle, SessionPhase::Aborted, false)]
    #[case(SessionPhase::Committed, SessionPhase::Aborted, false)]
    #[case(SessionPhase::Aborted, SessionPhase::Checkpointed, false)]
    fn transitions(#[case] from: SessionPhase, #[case] to: SessionPhase, #[case] allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn illegal_advance_is_internal_error() {
        let mut session = RotationSession::new(SessionId::new(), ResourceKind::AuthzPolicy);
        let err = session.advance(SessionPhase::Committed).unwrap_err();
        assert_eq!(err.code(), rotor_core::Code::Internal);
        assert_eq!(session.phase, SessionPhase::Idle);
    }

    #[rstest]
    #[case(SessionPhase::Idle, SessionPhase::Aborted)]
    #[case(SessionPhase::Checkpointed, SessionPhase::Aborted)]
    #[case(SessionPhase::Accumulating, SessionPhase::Aborted)]
    #[case(SessionPhase::Committed, SessionPhase::Committed)]
    #[case(SessionPhase::Aborted, SessionPhase::Aborted)]
    fn mark_aborted_never_fails(#[case] from: SessionPhase, #[case] expected: SessionPhase) {
        let mut session = RotationSession::new(SessionId::new(), ResourceKind::AuthzPolicy);
        session.phase = from;
        session.mark_aborted();
        assert_eq!(session.phase, expected);
    }

    #[test]
    fn terminal_phases() {
        assert!(SessionPhase::Committed.is_terminal());
        assert!(SessionPhase::Aborted.is_terminal());
        assert!(!SessionPhase::Accumulating.is_terminal());
        assert!(SessionPhase::Accumulating.holds_checkpoint());
    }
}
