//! Resource kinds that can be rotated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A class of security configuration rotated as one transaction.
///
/// At most one rotation session may be open per kind at any time; sessions
/// for different kinds are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// gRPC authorization policy document.
    AuthzPolicy,
    /// Path-based gNMI ACL policy.
    PathzPolicy,
    /// Per-account SSH authorized keys and principals.
    SshAccountCredential,
    /// Host-wide SSH parameters (trusted CA keys).
    SshHostParameter,
    /// Console account passwords.
    ConsoleCredential,
    /// GLOME URL-signing configuration.
    UrlSigningConfig,
}

impl ResourceKind {
    /// Every kind, in declaration order.
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::AuthzPolicy,
        ResourceKind::PathzPolicy,
        ResourceKind::SshAccountCredential,
        ResourceKind::SshHostParameter,
        ResourceKind::ConsoleCredential,
        ResourceKind::UrlSigningConfig,
    ];

    /// Stable snake_case name, used in log fields and config.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthzPolicy => "authz_policy",
            Self::PathzPolicy => "pathz_policy",
            Self::SshAccountCredential => "ssh_account_credential",
            Self::SshHostParameter => "ssh_host_parameter",
            Self::ConsoleCredential => "console_credential",
            Self::UrlSigningConfig => "url_signing_config",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
