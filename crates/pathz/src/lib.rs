//! # Rotor Pathz
//!
//! Path-based authorization for gNMI requests.
//!
//! A policy is a list of rules, each granting or denying one principal
//! (user or group) read or write access to a gNMI path. The
//! [`PathzAuthorizer`] compiles the rules into a trie and answers
//! `authorize(user, path, mode)` lookups; the rotation engine swaps its
//! policy atomically when a new one is committed.
//!
//! ```rust
//! use rotor_pathz::{Action, AuthorizationPolicy, AuthorizationRule, Mode, Path, PathzAuthorizer, Principal};
//!
//! let policy = AuthorizationPolicy {
//!     rules: vec![AuthorizationRule {
//!         id: "r1".into(),
//!         path: "/interfaces/interface[name=*]".parse().unwrap(),
//!         principal: Principal::User("alice".into()),
//!         mode: Mode::Read,
//!         action: Action::Permit,
//!     }],
//!     groups: vec![],
//! };
//! let authorizer = PathzAuthorizer::new();
//! authorizer.update_policy(policy).unwrap();
//!
//! let path: Path = "/interfaces/interface[name=Ethernet0]/state".parse().unwrap();
//! let result = authorizer.authorize("alice", &path, Mode::Read).unwrap();
//! assert_eq!(result.action, Action::Permit);
//! ```

mod authorizer;
mod error;
mod model;
mod trie;

pub use authorizer::{AuthzResult, PathzAuthorizer, PolicySnapshot, check_policy};
pub use error::{PathzError, PathzResult};
pub use model::{
    Action, AuthorizationPolicy, AuthorizationRule, Group, GroupMember, Mode, Path, PathElem,
    Principal, render_path,
};
