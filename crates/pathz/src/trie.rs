//! Rule trie.
//!
//! Every path element becomes a name node. An element with keys adds one
//! key node per key name, in sorted order, between its name node and the
//! next element. Each key node branches on the key value; `*` matches any
//! value.

use crate::error::{PathzError, PathzResult};
use crate::model::{Action, AuthorizationRule, Mode, PathElem, Principal, render_path};
use std::collections::{BTreeMap, HashMap, HashSet};

pub(crate) const WILDCARD: &str = "*";

#[derive(Debug, Clone, Default)]
pub(crate) struct RuleAction {
    pub rule_id: String,
    pub action: Action,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Permission {
    pub read: RuleAction,
    pub write: RuleAction,
}

impl Permission {
    /// Record a rule. Once a slot holds `Deny` it never changes.
    fn update(&mut self, mode: Mode, action: Action, rule_id: &str) {
        if action == Action::Unspecified {
            return;
        }
        let slot = match mode {
            Mode::Read => &mut self.read,
            Mode::Write => &mut self.write,
            Mode::Unspecified => return,
        };
        if slot.action == Action::Deny {
            return;
        }
        slot.action = action;
        slot.rule_id = rule_id.to_string();
    }

    fn get(&self, mode: Mode) -> Option<&RuleAction> {
        match mode {
            Mode::Read => Some(&self.read),
            Mode::Write => Some(&self.write),
            Mode::Unspecified => None,
        }
    }
}

/// Partial lookup result threaded through the walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Hit {
    pub action: Action,
    pub rule_id: String,
    pub matched_rule: String,
}

impl Hit {
    fn absorb(&mut self, permission: &Permission, mode: Mode, rule: &str) {
        if self.action == Action::Deny {
            return;
        }
        let Some(slot) = permission.get(mode) else {
            return;
        };
        if slot.action != Action::Unspecified {
            self.action = slot.action;
            self.rule_id.clone_from(&slot.rule_id);
            self.matched_rule = rule.to_string();
        }
    }

    fn is_match(&self) -> bool {
        self.action != Action::Unspecified && !self.matched_rule.is_empty()
    }
}

/// Group name to member user names.
pub(crate) type Membership = HashMap<String, HashSet<String>>;

/// Immutable lookup state for one walk.
struct Query<'a> {
    user: &'a str,
    path: &'a [PathElem],
    mode: Mode,
    membership: &'a Membership,
}

#[derive(Debug, Default)]
pub(crate) struct Node {
    users: BTreeMap<String, Permission>,
    groups: BTreeMap<String, Permission>,
    /// Rendered path of the rules terminating here.
    rule: String,
    name_next: HashMap<String, Node>,
    /// Key name this node branches on, set by the first keyed rule through it.
    key: Option<String>,
    key_next: HashMap<String, Node>,
}

impl Node {
    pub fn insert(&mut self, rule: &AuthorizationRule) -> PathzResult<()> {
        self.insert_at(rule, 0, &[], 0)
    }

    fn insert_at(
        &mut self,
        rule: &AuthorizationRule,
        name_idx: usize,
        keys: &[String],
        key_idx: usize,
    ) -> PathzResult<()> {
        let elem = &rule.path.elem;
        if name_idx >= elem.len() {
            self.rule = render_path(elem);
            let permission = match &rule.principal {
                Principal::User(name) => self.users.entry(name.clone()).or_default(),
                Principal::Group(name) => self.groups.entry(name.clone()).or_default(),
            };
            permission.update(rule.mode, rule.action, &rule.id);
            return Ok(());
        }

        if keys.is_empty() {
            let current = &elem[name_idx];
            let next = self.name_next.entry(current.name.clone()).or_default();
            if current.key.is_empty() {
                return next.insert_at(rule, name_idx + 1, &[], 0);
            }
            let sorted: Vec<String> = current.key.keys().cloned().collect();
            return next.insert_at(rule, name_idx, &sorted, 0);
        }

        let key_name = &keys[key_idx];
        match &self.key {
            Some(existing) if existing != key_name => {
                return Err(PathzError::KeyMismatch {
                    rule_id: rule.id.clone(),
                    node_key: existing.clone(),
                    rule_key: key_name.clone(),
                });
            }
            Some(_) => {}
            None => self.key = Some(key_name.clone()),
        }
        let value = elem[name_idx]
            .key
            .get(key_name)
            .cloned()
            .unwrap_or_default();
        let next = self.key_next.entry(value).or_default();
        if key_idx + 1 == keys.len() {
            next.insert_at(rule, name_idx + 1, &[], 0)
        } else {
            next.insert_at(rule, name_idx, keys, key_idx + 1)
        }
    }

    pub fn authorize(
        &self,
        user: &str,
        path: &[PathElem],
        mode: Mode,
        membership: &Membership,
    ) -> Hit {
        let query = Query {
            user,
            path,
            mode,
            membership,
        };
        self.walk(&query, 0, &[], 0)
    }

    fn walk(&self, q: &Query<'_>, name_idx: usize, keys: &[String], key_idx: usize) -> Hit {
        let mut hit = Hit::default();
        if let Some(permission) = self.users.get(q.user) {
            hit.absorb(permission, q.mode, &self.rule);
        }
        if !hit.is_match() {
            for (group, permission) in &self.groups {
                let member = q
                    .membership
                    .get(group)
                    .is_some_and(|users| users.contains(q.user));
                if member {
                    hit.absorb(permission, q.mode, &self.rule);
                    if hit.action == Action::Deny {
                        break;
                    }
                }
            }
        }

        if name_idx >= q.path.len() {
            return hit;
        }

        if !keys.is_empty() {
            let Some(node_key) = self.key.as_deref() else {
                return hit;
            };
            if keys[key_idx] != node_key {
                return hit;
            }
            let Some(value) = q.path[name_idx].key.get(node_key) else {
                return hit;
            };
            let last_key = key_idx + 1 == keys.len();
            for candidate in [value.as_str(), WILDCARD] {
                if let Some(next) = self.key_next.get(candidate) {
                    let deeper = if last_key {
                        next.walk(q, name_idx + 1, &[], 0)
                    } else {
                        next.walk(q, name_idx, keys, key_idx + 1)
                    };
                    if deeper.is_match() {
                        return deeper;
                    }
                }
            }
            return hit;
        }

        let current = &q.path[name_idx];
        if let Some(next) = self.name_next.get(&current.name) {
            let deeper = if current.key.is_empty() {
                next.walk(q, name_idx + 1, &[], 0)
            } else {
                let sorted: Vec<String> = current.key.keys().cloned().collect();
                next.walk(q, name_idx, &sorted, 0)
            };
            if deeper.is_match() {
                return deeper;
            }
        }
        hit
    }
}
