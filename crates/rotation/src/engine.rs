//! The rotation transaction engine.
//!
//! One [`Engine`] per resource kind. Each call to [`Engine::run`] drives a
//! single Rotate stream through
//! `Idle -> Checkpointed -> Accumulating* -> Committed | Aborted`:
//!
//! - the kind's guard is taken without waiting, before anything else;
//! - the backing store is checkpointed once;
//! - every upload is validated, applied and acknowledged in receive order;
//! - Finalize commits the store and then saves the freshness ledger;
//! - any other ending (bad message, stream closed, transport failure,
//!   backend failure) rolls the store back.
//!
//! Exactly one of commit or rollback runs per checkpoint, and the guard is
//! released when `run` returns whichever way it ends.

use rotor_core::{SessionId, Status};
use std::sync::Arc;
use tracing::Instrument;

use crate::error::ValidationError;
use crate::guard::GuardRegistry;
use crate::ledger::FreshnessLedger;
use crate::protocol::{Inbound, RotationProtocol};
use crate::session::{RotationSession, SessionPhase};
use crate::store::BackingStore;
use crate::stream::RotateStream;

/// Status message when the kind's guard is already held.
pub const CONCURRENT_ROTATION: &str = "concurrent rotation not allowed";
/// Status message when the client closes the stream without committing.
pub const NO_FINALIZE: &str = "No Finalize message";

/// Drives Rotate streams of one kind against its store and ledger.
pub struct Engine<P, S>
where
    P: RotationProtocol,
{
    protocol: P,
    store: S,
    ledger: Arc<dyn FreshnessLedger<P::Record>>,
    guards: GuardRegistry,
}

impl<P, S> std::fmt::Debug for Engine<P, S>
where
    P: RotationProtocol + std::fmt::Debug,
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("protocol", &self.protocol)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<P, S> Engine<P, S>
where
    P: RotationProtocol,
    S: BackingStore<P::Change>,
{
    pub fn new(
        protocol: P,
        store: S,
        ledger: Arc<dyn FreshnessLedger<P::Record>>,
        guards: GuardRegistry,
    ) -> Self {
        Self {
            protocol,
            store,
            ledger,
            guards,
        }
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &Arc<dyn FreshnessLedger<P::Record>> {
        &self.ledger
    }

    /// Run one session to completion.
    ///
    /// `first` is a message the caller already read off `stream` (used when
    /// an RPC serves several kinds and had to look at the first message to
    /// pick the engine). Returns `Ok(())` only after a successful commit.
    pub async fn run<St>(&self, stream: &mut St, first: Option<P::Request>) -> Result<(), Status>
    where
        St: RotateStream<P::Request, P::Response> + ?Sized,
    {
        let id = SessionId::new();
        let span = tracing::info_span!("rotation", session = %id, kind = %self.protocol.kind());
        self.run_session(id, stream, first).instrument(span).await
    }

    async fn run_session<St>(
        &self,
        id: SessionId,
        stream: &mut St,
        mut pending: Option<P::Request>,
    ) -> Result<(), Status>
    where
        St: RotateStream<P::Request, P::Response> + ?Sized,
    {
        let kind = self.protocol.kind();
        let Some(_guard) = self.guards.try_acquire(kind, id) else {
            return Err(Status::aborted(CONCURRENT_ROTATION));
        };

        let committed = self.ledger.load().await.map_err(|e| {
            tracing::error!(error = %e, "failed to load freshness ledger");
            Status::from(e)
        })?;
        let mut working = committed.clone();

        let mut session = RotationSession::new(id, kind);
        let token = self.store.checkpoint().await.map_err(|e| {
            tracing::warn!(error = %e, "checkpoint failed");
            Status::from(e)
        })?;
        session.checkpoint = Some(format!("{token:?}"));
        if let Err(status) = session.advance(SessionPhase::Checkpointed) {
            return Err(self.abort(&mut session, &token, status).await);
        }
        tracing::info!("checkpoint taken");

        loop {
            let next = match pending.take() {
                Some(request) => Some(Ok(request)),
                None => stream.recv().await,
            };
            let request = match next {
                Some(Ok(request)) => request,
                Some(Err(status)) => {
                    let status = Status::aborted(status.message());
                    return Err(self.abort(&mut session, &token, status).await);
                }
                None => {
                    return Err(self
                        .abort(&mut session, &token, Status::aborted(NO_FINALIZE))
                        .await);
                }
            };

            let change = match self.protocol.classify(request, session.staged) {
                Ok(Inbound::Upload(change)) => change,
                Ok(Inbound::Finalize) => {
                    return self.finalize(&mut session, &token, &working).await;
                }
                Err(e) => return Err(self.reject(&mut session, &token, e).await),
            };

            if let Err(e) = self.protocol.validate(&change) {
                return Err(self.reject(&mut session, &token, e).await);
            }

            if let Some(message) = self.protocol.already_committed(&committed, &change) {
                return Err(self.duplicate(&mut session, &token, message).await);
            }

            if let Err(e) = self.store.apply(&change).await {
                tracing::warn!(error = %e, "apply failed");
                return Err(self.abort(&mut session, &token, e.into()).await);
            }
            self.protocol.record(&mut working, &change);
            session.staged += 1;
            if let Err(status) = session.advance(SessionPhase::Accumulating) {
                return Err(self.abort(&mut session, &token, status).await);
            }
            tracing::debug!(staged = session.staged, "change applied");

            if let Err(status) = stream.send(self.protocol.ack(&change)).await {
                tracing::warn!(error = %status, "failed to acknowledge change");
                let status = Status::aborted(status.message());
                return Err(self.abort(&mut session, &token, status).await);
            }
        }
    }

    async fn finalize(
        &self,
        session: &mut RotationSession,
        token: &S::Token,
        working: &P::Record,
    ) -> Result<(), Status> {
        if let Err(e) = self.protocol.can_finalize(session.staged) {
            return Err(self.reject(session, token, e).await);
        }

        if let Err(e) = self.store.commit(token).await {
            tracing::error!(error = %e, "commit failed");
            return Err(self.abort(session, token, e.into()).await);
        }
        session.advance(SessionPhase::Committed)?;

        if session.staged > 0 {
            if let Err(e) = self.ledger.save(working).await {
                // The new state is live; only its version stamp was lost.
                tracing::error!(error = %e, "committed but failed to save freshness ledger");
                return Err(e.into());
            }
        }

        tracing::info!(
            staged = session.staged,
            elapsed_ms = session.elapsed().num_milliseconds(),
            "rotation committed"
        );
        Ok(())
    }

    async fn reject(
        &self,
        session: &mut RotationSession,
        token: &S::Token,
        error: ValidationError,
    ) -> Status {
        tracing::warn!(
            category = error.category(),
            reason = error.log_text(),
            staged = session.staged,
            "rejected rotation message"
        );
        self.roll_back(session, token).await;
        error.into()
    }

    /// Already-committed version. Nothing staged means nothing to undo, so
    /// the checkpoint is simply discarded.
    async fn duplicate(
        &self,
        session: &mut RotationSession,
        token: &S::Token,
        message: String,
    ) -> Status {
        tracing::info!(reason = %message, "version already committed");
        if session.staged == 0 {
            if let Err(e) = self.store.commit(token).await {
                tracing::error!(error = %e, "failed to discard checkpoint");
            }
            session.mark_aborted();
        } else {
            self.roll_back(session, token).await;
        }
        Status::already_exists(message)
    }

    async fn abort(&self, session: &mut RotationSession, token: &S::Token, status: Status) -> Status {
        tracing::warn!(code = %status.code(), reason = status.message(), staged = session.staged, "rotation aborted");
        self.roll_back(session, token).await;
        status
    }

    async fn roll_back(&self, session: &mut RotationSession, token: &S::Token) {
        match self.store.rollback(token).await {
            Ok(()) => tracing::info!("rolled back"),
            Err(e) => {
                tracing::error!(error = %e, checkpoint = ?session.checkpoint, "rollback failed, state must be reconciled by hand");
            }
        }
        session.mark_aborted();
    }
}
