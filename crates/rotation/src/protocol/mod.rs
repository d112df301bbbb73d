//! Per-kind rotation rules.
//!
//! A [`RotationProtocol`] tells the engine how to read one kind's stream:
//! which messages are uploads, how to validate them, what to echo back and
//! how a committed change updates the freshness record. Everything that
//! touches state lives in the matching [`BackingStore`](crate::store::BackingStore).

pub mod authz;
pub mod console;
pub mod glome;
pub mod pathz;
pub mod ssh_account;
pub mod ssh_host;

pub use authz::{AuthzChange, AuthzProtocol};
pub use console::ConsoleProtocol;
pub use glome::GlomeProtocol;
pub use pathz::{PathzChange, PathzProtocol};
pub use ssh_account::{SshAccountChange, SshAccountProtocol};
pub use ssh_host::SshHostProtocol;

use rotor_core::{FreshnessRecord, ResourceKind};

use crate::error::{ValidationError, ValidationResult};

/// A classified stream message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound<C> {
    Upload(C),
    Finalize,
}

/// Message used when a kind needs an upload before Finalize.
pub const FINALIZE_WITHOUT_UPLOAD: &str = "Received finalize message without successful rotation";

pub trait RotationProtocol: Send + Sync + 'static {
    type Request: Send + 'static;
    type Response: Send + 'static;
    type Change: Send + Sync + 'static;
    type Record: Clone + Send + Sync + 'static;

    fn kind(&self) -> ResourceKind;

    /// Sort a raw request into upload or Finalize. `staged` is the number of
    /// uploads already applied in this session.
    fn classify(
        &self,
        request: Self::Request,
        staged: usize,
    ) -> ValidationResult<Inbound<Self::Change>>;

    fn validate(&self, change: &Self::Change) -> ValidationResult<()>;

    /// `Some(message)` when `change` re-sends the committed version without
    /// asking to overwrite it.
    fn already_committed(&self, _committed: &Self::Record, _change: &Self::Change) -> Option<String> {
        None
    }

    fn can_finalize(&self, _staged: usize) -> ValidationResult<()> {
        Ok(())
    }

    /// Fold an applied change into the working ledger record.
    fn record(&self, record: &mut Self::Record, change: &Self::Change);

    fn ack(&self, change: &Self::Change) -> Self::Response;
}

pub(crate) fn require_upload(staged: usize) -> ValidationResult<()> {
    if staged == 0 {
        return Err(ValidationError::conflict(FINALIZE_WITHOUT_UPLOAD));
    }
    Ok(())
}

pub(crate) fn duplicate_version(
    label: &str,
    committed: &FreshnessRecord,
    version: &str,
    force: bool,
) -> Option<String> {
    (!force && committed.version == version)
        .then(|| format!("{label} with version `{version}` already exists"))
}
