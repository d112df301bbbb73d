//! Key layout under the `CREDENTIALS` table.

use std::fmt;

/// Root table for all credential metadata.
pub const CREDENTIALS_TABLE: &str = "CREDENTIALS";
/// Separator between key segments.
pub const SEPARATOR: &str = "|";

/// A `CREDENTIALS|<table>[|<key>]` hash key.
///
/// ```rust
/// use rotor_statedb::StateKey;
///
/// assert_eq!(StateKey::new("SSH_HOST").to_string(), "CREDENTIALS|SSH_HOST");
/// assert_eq!(
///     StateKey::new("SSH_ACCOUNT").with_key("admin").to_string(),
///     "CREDENTIALS|SSH_ACCOUNT|admin"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey(String);

impl StateKey {
    /// `table` may itself contain separators, e.g. `AUTHZ_POLICY|p4rt`.
    pub fn new(table: &str) -> Self {
        Self(format!("{CREDENTIALS_TABLE}{SEPARATOR}{table}"))
    }

    /// Append a key segment; an empty segment is skipped.
    pub fn with_key(mut self, key: &str) -> Self {
        if !key.is_empty() {
            self.0.push_str(SEPARATOR);
            self.0.push_str(key);
        }
        self
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
