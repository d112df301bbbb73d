//! Builders for `set` payloads.
//!
//! The daemon does not use a JSON parser tolerant of reformatting for
//! every service, so the layout (spacing around `:` included) is fixed.
//! String values are JSON-escaped; for plain values the output is identical
//! to an unescaped template.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// `name`/`value` option attached to a key or principal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOption {
    pub name: String,
    pub value: String,
}

/// One `authorized_keys` line with its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLine {
    /// `<type-prefix> <base64-key> <description>`, see [`key_line`].
    pub key: String,
    pub options: Vec<LineOption>,
}

/// Authorized keys for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountKeys {
    pub account: String,
    pub keys: Vec<KeyLine>,
}

/// One `authorized_principals` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalLine {
    pub name: String,
    pub options: Vec<LineOption>,
}

/// Authorized principals for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUsers {
    pub account: String,
    pub users: Vec<PrincipalLine>,
}

/// Plaintext console password for one account.
#[derive(Clone, PartialEq, Eq)]
pub struct ConsolePassword {
    pub name: String,
    pub password: String,
}

impl std::fmt::Debug for ConsolePassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsolePassword")
            .field("name", &self.name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Render an SSH public key line: type prefix, standard base64 of the raw
/// key, description.
pub fn key_line(prefix: &str, key: &[u8], description: &str) -> String {
    format!("{prefix} {} {description}", STANDARD.encode(key))
}

/// `{ "SshAccountKeys": [ ... ] }`
pub fn ssh_account_keys(accounts: &[AccountKeys]) -> String {
    let mut b = String::from(r#"{ "SshAccountKeys": [ "#);
    for (i, account) in accounts.iter().enumerate() {
        b.push_str(&format!(r#"{{ "account": {}, "keys": ["#, quote(&account.account)));
        for (j, key) in account.keys.iter().enumerate() {
            b.push_str(&format!(r#" {{ "key" : {}, "options" : ["#, quote(&key.key)));
            push_options(&mut b, &key.options);
            b.push_str(" ] }");
            separator(&mut b, j, account.keys.len());
        }
        b.push_str(" ] }");
        separator(&mut b, i, accounts.len());
    }
    b.push_str(" ] }");
    b
}

/// `{ "SshAccountUsers": [ ... ] }`
pub fn ssh_account_users(accounts: &[AccountUsers]) -> String {
    let mut b = String::from(r#"{ "SshAccountUsers": ["#);
    for (i, account) in accounts.iter().enumerate() {
        b.push_str(&format!(r#" {{ "account": {}, "users": ["#, quote(&account.account)));
        for (j, user) in account.users.iter().enumerate() {
            b.push_str(&format!(r#" {{ "name" : {}, "options" : ["#, quote(&user.name)));
            push_options(&mut b, &user.options);
            b.push_str(" ] }");
            separator(&mut b, j, account.users.len());
        }
        b.push_str(" ] }");
        separator(&mut b, i, accounts.len());
    }
    b.push_str(" ] }");
    b
}

/// `{ "ConsolePasswords": [ ... ] }`
pub fn console_passwords(accounts: &[ConsolePassword]) -> String {
    let mut b = String::from(r#"{ "ConsolePasswords": [ "#);
    for (i, account) in accounts.iter().enumerate() {
        b.push_str(&format!(
            r#"{{ "name": {}, "password" : {} }}"#,
            quote(&account.name),
            quote(&account.password)
        ));
        separator(&mut b, i, accounts.len());
    }
    b.push_str(" ] }");
    b
}

/// `{ "SshCaPublicKey": [ ... ] }`
pub fn ssh_ca_public_keys(keys: &[String]) -> String {
    let mut b = String::from(r#"{ "SshCaPublicKey": ["#);
    for (i, key) in keys.iter().enumerate() {
        b.push(' ');
        b.push_str(&quote(key));
        separator(&mut b, i, keys.len());
    }
    b.push_str(" ] }");
    b
}

fn push_options(b: &mut String, options: &[LineOption]) {
    for (k, option) in options.iter().enumerate() {
        b.push_str(&format!(
            r#" {{ "name" : {}, "value": {} }}"#,
            quote(&option.name),
            quote(&option.value)
        ));
        separator(b, k, options.len());
    }
}

fn separator(b: &mut String, index: usize, len: usize) {
    if index + 1 < len {
        b.push(',');
    }
}

fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn option(name: &str, value: &str) -> LineOption {
        LineOption {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn key_line_encodes_raw_key() {
        assert_eq!(key_line("ssh-ed25519", b"key", "laptop"), "ssh-ed25519 a2V5 laptop");
    }

    #[test]
    fn account_keys_layout() {
        let payload = ssh_account_keys(&[AccountKeys {
            account: "admin".to_string(),
            keys: vec![
                KeyLine {
                    key: "ssh-rsa AAAA a".to_string(),
                    options: vec![option("from", "10.0.0.1"), option("no-pty", "")],
                },
                KeyLine {
                    key: "ssh-ed25519 BBBB b".to_string(),
                    options: vec![],
                },
            ],
        }]);
        assert_eq!(
            payload,
            r#"{ "SshAccountKeys": [ { "account": "admin", "keys": [ { "key" : "ssh-rsa AAAA a", "options" : [ { "name" : "from", "value": "10.0.0.1" }, { "name" : "no-pty", "value": "" } ] }, { "key" : "ssh-ed25519 BBBB b", "options" : [ ] } ] } ] }"#
        );
    }

    #[test]
    fn account_users_layout() {
        let payload = ssh_account_users(&[
            AccountUsers {
                account: "admin".to_string(),
                users: vec![PrincipalLine {
                    name: "alice".to_string(),
                    options: vec![option("command", "/bin/true")],
                }],
            },
            AccountUsers {
                account: "ops".to_string(),
                users: vec![PrincipalLine {
                    name: "bob".to_string(),
                    options: vec![],
                }],
            },
        ]);
        assert_eq!(
            payload,
            r#"{ "SshAccountUsers": [ { "account": "admin", "users": [ { "name" : "alice", "options" : [ { "name" : "command", "value": "/bin/true" } ] } ] }, { "account": "ops", "users": [ { "name" : "bob", "options" : [ ] } ] } ] }"#
        );
    }

    #[test]
    fn console_layout() {
        let payload = console_passwords(&[
            ConsolePassword {
                name: "admin".to_string(),
                password: "s3cret".to_string(),
            },
            ConsolePassword {
                name: "root".to_string(),
                password: "hunter2".to_string(),
            },
        ]);
        assert_eq!(
            payload,
            r#"{ "ConsolePasswords": [ { "name": "admin", "password" : "s3cret" },{ "name": "root", "password" : "hunter2" } ] }"#
        );
    }

    #[test]
    fn ca_layout() {
        let payload = ssh_ca_public_keys(&["ssh-rsa AAAA ca1".to_string(), "ssh-ed25519 BBBB ca2".to_string()]);
        assert_eq!(
            payload,
            r#"{ "SshCaPublicKey": [ "ssh-rsa AAAA ca1", "ssh-ed25519 BBBB ca2" ] }"#
        );
    }

    #[test]
    fn values_are_escaped() {
        let payload = console_passwords(&[ConsolePassword {
            name: "admin".to_string(),
            password: r#"a"b\c"#.to_string(),
        }]);
        assert!(payload.contains(r#""password" : "a\"b\\c""#));
        let parsed: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(parsed["ConsolePasswords"][0]["password"], r#"a"b\c"#);
    }

    #[test]
    fn password_is_redacted_in_debug() {
        let entry = ConsolePassword {
            name: "admin".to_string(),
            password: "s3cret".to_string(),
        };
        assert!(!format!("{entry:?}").contains("s3cret"));
    }
}
