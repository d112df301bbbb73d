//! # Rotor Core
//!
//! Shared vocabulary for the rotor crates.
//!
//! ## Key Components
//!
//! - **Identifiers**: [`SessionId`] tags every rotation session in logs
//! - **Resource kinds**: [`ResourceKind`], the unit of mutual exclusion
//! - **RPC status**: [`Status`] and [`Code`], the single error shape that
//!   crosses the RPC boundary
//! - **Freshness records**: [`FreshnessRecord`] and [`SigningConfigRecord`]
//!
//! ## Usage
//!
//! ```rust
//! use rotor_core::{Code, ResourceKind, SessionId, Status};
//!
//! let session = SessionId::new();
//! let busy = Status::aborted(format!("concurrent rotation not allowed for {}", ResourceKind::AuthzPolicy));
//! assert_eq!(busy.code(), Code::Aborted);
//! assert!(!session.to_string().is_empty());
//! ```

pub mod id;
pub mod kind;
pub mod record;
pub mod status;

pub use id::SessionId;
pub use kind::ResourceKind;
pub use record::{FieldParseError, FreshnessRecord, SigningConfigRecord, UNKNOWN_VERSION};
pub use status::{Code, Status};

/// Result type used at the RPC boundary
pub type Result<T> = std::result::Result<T, Status>;

/// Common prelude for rotor crates
pub mod prelude {
    pub use super::{
        Code, FreshnessRecord, ResourceKind, Result, SessionId, SigningConfigRecord, Status,
    };
}
