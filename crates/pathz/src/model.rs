//! Pathz policy document model.

use crate::error::PathzError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Access mode a rule applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Unspecified,
    Read,
    Write,
}

/// Outcome of a rule, or of a lookup.
///
/// `Unspecified` as a lookup result means no rule matched and the caller
/// must deny.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    Unspecified,
    Permit,
    Deny,
}

/// Who a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Principal {
    User(String),
    Group(String),
}

/// One element of a gNMI path; keys are kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathElem {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub key: BTreeMap<String, String>,
}

impl PathElem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: BTreeMap::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.key.insert(key.into(), value.into());
        self
    }
}

/// A gNMI path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin: String,
    #[serde(default)]
    pub elem: Vec<PathElem>,
}

impl Path {
    pub fn new(elem: Vec<PathElem>) -> Self {
        Self {
            origin: String::new(),
            elem,
        }
    }

    /// `self` followed by the elements of `rest`.
    pub fn join(&self, rest: &Path) -> Path {
        let mut elem = self.elem.clone();
        elem.extend(rest.elem.iter().cloned());
        Path {
            origin: self.origin.clone(),
            elem,
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_path(&self.elem))
    }
}

impl FromStr for Path {
    type Err = PathzError;

    /// Parse `/a/b[k=v]/c`. A `/` inside brackets belongs to the key value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PathzError::InvalidPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let mut elem = Vec::new();
        let mut chars = s.trim_start_matches('/').chars().peekable();
        while chars.peek().is_some() {
            let mut current = PathElem::default();
            while let Some(&c) = chars.peek() {
                if c == '/' || c == '[' {
                    break;
                }
                current.name.push(c);
                chars.next();
            }
            while chars.peek() == Some(&'[') {
                chars.next();
                let mut key = String::new();
                let mut value = String::new();
                let mut in_value = false;
                let mut closed = false;
                for c in chars.by_ref() {
                    match c {
                        ']' => {
                            closed = true;
                            break;
                        }
                        '=' if !in_value => in_value = true,
                        _ if in_value => value.push(c),
                        _ => key.push(c),
                    }
                }
                if !closed {
                    return Err(invalid("unterminated key"));
                }
                if !in_value || key.is_empty() {
                    return Err(invalid("key must be name=value"));
                }
                current.key.insert(key, value);
            }
            if current.name.is_empty() {
                return Err(invalid("empty element name"));
            }
            elem.push(current);
            match chars.next() {
                None | Some('/') => {}
                Some(_) => return Err(invalid("expected `/` after key")),
            }
        }
        Ok(Path::new(elem))
    }
}

/// Render elements as `/a/b[k=v]`, keys in sorted order, `/` when empty.
pub fn render_path(elem: &[PathElem]) -> String {
    if elem.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for e in elem {
        out.push('/');
        out.push_str(&e.name);
        for (k, v) in &e.key {
            out.push('[');
            out.push_str(k);
            out.push('=');
            out.push_str(v);
            out.push(']');
        }
    }
    out
}

/// One grant or denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRule {
    pub id: String,
    pub path: Path,
    pub principal: Principal,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub name: String,
}

/// Named set of users that rules may target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub users: Vec<GroupMember>,
}

/// A complete pathz policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationPolicy {
    #[serde(default)]
    pub rules: Vec<AuthorizationRule>,
    #[serde(default)]
    pub groups: Vec<Group>,
}
