//! Live pathz authorizer with atomic policy replacement.

use crate::error::{PathzError, PathzResult};
use crate::model::{Action, AuthorizationPolicy, Mode, Path};
use crate::trie::{Membership, Node};
use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Result of one authorization lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthzResult {
    /// `Unspecified` when no rule matched; callers treat that as deny.
    pub action: Action,
    /// Id of the deciding rule.
    pub rule_id: String,
    /// Rendered path of the deciding rule.
    pub matched_rule: String,
}

impl AuthzResult {
    pub fn is_permitted(&self) -> bool {
        self.action == Action::Permit
    }
}

/// A compiled policy: trie, group membership, and the source document.
#[derive(Debug)]
struct Compiled {
    root: Node,
    membership: Membership,
    policy: AuthorizationPolicy,
}

impl Compiled {
    fn build(policy: AuthorizationPolicy) -> PathzResult<Self> {
        if policy.rules.is_empty() {
            return Err(PathzError::NoRules);
        }
        let mut root = Node::default();
        for rule in &policy.rules {
            root.insert(rule)?;
        }
        let mut membership = Membership::new();
        for group in &policy.groups {
            let users = membership.entry(group.name.clone()).or_default();
            users.extend(group.users.iter().map(|u| u.name.clone()));
        }
        Ok(Self {
            root,
            membership,
            policy,
        })
    }
}

/// Check that a policy would compile, without installing it.
pub fn check_policy(policy: &AuthorizationPolicy) -> PathzResult<()> {
    Compiled::build(policy.clone()).map(|_| ())
}

/// Opaque copy of the installed policy, for rollback.
#[derive(Debug, Clone)]
pub struct PolicySnapshot(Option<Arc<Compiled>>);

impl PolicySnapshot {
    /// True when no policy was installed at snapshot time.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

/// Evaluates gNMI requests against the installed pathz policy.
///
/// With no policy installed every lookup yields `Action::Unspecified`.
#[derive(Debug, Default)]
pub struct PathzAuthorizer {
    current: ArcSwapOption<Compiled>,
}

impl PathzAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authorize(&self, user: &str, path: &Path, mode: Mode) -> PathzResult<AuthzResult> {
        if mode == Mode::Unspecified {
            return Err(PathzError::InvalidMode);
        }
        let guard = self.current.load();
        let Some(compiled) = guard.as_ref() else {
            return Ok(AuthzResult::default());
        };
        let hit = compiled
            .root
            .authorize(user, &path.elem, mode, &compiled.membership);
        let result = AuthzResult {
            action: hit.action,
            rule_id: hit.rule_id,
            matched_rule: hit.matched_rule,
        };
        if !result.is_permitted() {
            tracing::debug!(
                user,
                path = %path,
                ?mode,
                rule_id = %result.rule_id,
                "pathz did not permit request"
            );
        }
        Ok(result)
    }

    /// Authorize `prefix` followed by `path`.
    pub fn authorize_with_prefix(
        &self,
        user: &str,
        prefix: &Path,
        path: &Path,
        mode: Mode,
    ) -> PathzResult<AuthzResult> {
        self.authorize(user, &prefix.join(path), mode)
    }

    /// Compile `policy` and swap it in. On error the installed policy is kept.
    pub fn update_policy(&self, policy: AuthorizationPolicy) -> PathzResult<()> {
        let compiled = Compiled::build(policy)?;
        let rules = compiled.policy.rules.len();
        self.current.store(Some(Arc::new(compiled)));
        tracing::info!(rules, "pathz policy installed");
        Ok(())
    }

    /// Load a JSON policy document from disk and install it.
    pub fn update_policy_from_file(&self, path: &std::path::Path) -> PathzResult<()> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|e| PathzError::Io {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        let policy: AuthorizationPolicy =
            serde_json::from_str(&raw).map_err(|e| PathzError::Parse {
                path: display,
                reason: e.to_string(),
            })?;
        self.update_policy(policy)
    }

    /// The installed policy document, if any.
    pub fn policy(&self) -> Option<AuthorizationPolicy> {
        self.current.load().as_ref().map(|c| c.policy.clone())
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot(self.current.load_full())
    }

    /// Reinstall exactly what `snapshot` captured.
    pub fn restore(&self, snapshot: PolicySnapshot) {
        self.current.store(snapshot.0);
    }
}
