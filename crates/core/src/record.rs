//! Freshness records: the version bookkeeping that survives restarts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version reported for a resource that has never been rotated.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Currently committed `{version, created_on}` of one rotated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessRecord {
    pub version: String,
    pub created_on: u64,
}

impl FreshnessRecord {
    pub fn new(version: impl Into<String>, created_on: u64) -> Self {
        Self {
            version: version.into(),
            created_on,
        }
    }

    /// True if nothing has ever been committed for this artifact.
    pub fn is_unknown(&self) -> bool {
        self.version == UNKNOWN_VERSION && self.created_on == 0
    }
}

impl Default for FreshnessRecord {
    fn default() -> Self {
        Self::new(UNKNOWN_VERSION, 0)
    }
}

/// Error decoding a [`SigningConfigRecord`] from its stored fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to parse field `{field}` from value `{value}`: {reason}")]
pub struct FieldParseError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
}

/// Committed GLOME signing-config metadata.
///
/// The key itself never lives here; only the facts an operator needs to
/// tell which key is live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningConfigRecord {
    pub enabled: bool,
    pub key_version: u32,
    /// Unix nanoseconds of the last successful push.
    pub last_updated: i64,
}

impl SigningConfigRecord {
    pub const FIELD_ENABLED: &'static str = "enabled";
    pub const FIELD_KEY_VERSION: &'static str = "key_version";
    pub const FIELD_LAST_UPDATED: &'static str = "last_updated";

    /// Flatten into hash fields, in a stable order.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        vec![
            (Self::FIELD_ENABLED.to_string(), self.enabled.to_string()),
            (
                Self::FIELD_KEY_VERSION.to_string(),
                self.key_version.to_string(),
            ),
            (
                Self::FIELD_LAST_UPDATED.to_string(),
                self.last_updated.to_string(),
            ),
        ]
    }

    /// Decode from hash fields.
    ///
    /// Every field must be present and parse. Callers treat an empty hash
    /// (nothing ever written) as the default before getting here, so a
    /// hash missing only some fields is corrupt.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, FieldParseError> {
        let field = |name: &'static str| fields.get(name).map_or("", String::as_str);
        Ok(Self {
            enabled: parse_field(Self::FIELD_ENABLED, field(Self::FIELD_ENABLED))?,
            key_version: parse_field(Self::FIELD_KEY_VERSION, field(Self::FIELD_KEY_VERSION))?,
            last_updated: parse_field(Self::FIELD_LAST_UPDATED, field(Self::FIELD_LAST_UPDATED))?,
        })
    }
}

fn parse_field<T>(field: &'static str, value: &str) -> Result<T, FieldParseError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| FieldParseError {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn default_record_is_unknown() {
        let record = FreshnessRecord::default();
        assert_eq!(record.version, "unknown");
        assert_eq!(record.created_on, 0);
        assert!(record.is_unknown());
        assert!(!FreshnessRecord::new("v1", 0).is_unknown());
    }

    #[test]
    fn signing_config_fields_roundtrip() {
        let record = SigningConfigRecord {
            enabled: true,
            key_version: 7,
            last_updated: 1_700_000_000_000_000_000,
        };
        let fields: HashMap<_, _> = record.to_fields().into_iter().collect();
        assert_eq!(fields["enabled"], "true");
        assert_eq!(SigningConfigRecord::from_fields(&fields).unwrap(), record);
    }

    #[test]
    fn signing_config_partial_hash_is_error() {
        let fields = HashMap::from([
            ("enabled".to_string(), "true".to_string()),
            ("key_version".to_string(), "3".to_string()),
        ]);
        let err = SigningConfigRecord::from_fields(&fields).unwrap_err();
        assert_eq!(err.field, "last_updated");
        assert_eq!(err.value, "");
    }

    #[rstest]
    #[case("enabled", "yes")]
    #[case("key_version", "-1")]
    #[case("last_updated", "soon")]
    #[case("enabled", "")]
    fn signing_config_bad_field_is_error(#[case] field: &str, #[case] value: &str) {
        let mut fields: HashMap<_, _> = SigningConfigRecord::default()
            .to_fields()
            .into_iter()
            .collect();
        fields.insert(field.to_string(), value.to_string());
        let err = SigningConfigRecord::from_fields(&fields).unwrap_err();
        assert_eq!(err.field, field);
    }
}
