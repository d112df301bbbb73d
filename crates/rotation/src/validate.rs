//! Pure per-message validation. No I/O.

use rotor_pathz::AuthorizationPolicy;

use crate::error::{ValidationError, ValidationResult};
use crate::messages::{
    AuthorizedKeysRequest, AuthorizedUsersRequest, CaPublicKeyRequest, GlomeRequest, Password,
    PasswordRequest,
};

fn require(present: bool, message: &str) -> ValidationResult<()> {
    if present {
        Ok(())
    } else {
        Err(ValidationError::malformed(message))
    }
}

fn stamp(version: &str, created_on: u64) -> ValidationResult<()> {
    require(!version.is_empty(), "version cannot be empty")?;
    require(created_on != 0, "created_on cannot be empty")
}

pub fn authz_upload(version: &str, policy: &str) -> ValidationResult<()> {
    require(!policy.is_empty(), "Authz policy cannot be empty")?;
    require(!version.is_empty(), "Authz policy version cannot be empty")?;
    if serde_json::from_str::<serde_json::Value>(policy).is_err() {
        return Err(ValidationError::invalid_content(format!(
            "Authz policy `{policy}` is malformed"
        )));
    }
    Ok(())
}

/// The rules must also compile into an authorizer.
pub fn pathz_upload(version: &str, policy: &AuthorizationPolicy) -> ValidationResult<()> {
    require(!version.is_empty(), "Pathz policy version cannot be empty")?;
    rotor_pathz::check_policy(policy)
        .map_err(|e| ValidationError::invalid_content(e.to_string()))
}

pub fn authorized_keys(request: &AuthorizedKeysRequest) -> ValidationResult<()> {
    require(!request.credentials.is_empty(), "credentials cannot be empty")?;
    for entry in &request.credentials {
        stamp(&entry.version, entry.created_on)?;
        require(!entry.account.is_empty(), "account cannot be empty")?;
        require(!entry.authorized_keys.is_empty(), "authorized_keys cannot be empty")?;
    }
    Ok(())
}

pub fn authorized_users(request: &AuthorizedUsersRequest) -> ValidationResult<()> {
    require(!request.policies.is_empty(), "policies cannot be empty")?;
    for entry in &request.policies {
        stamp(&entry.version, entry.created_on)?;
        require(!entry.account.is_empty(), "account cannot be empty")?;
        require(
            !entry.authorized_principals.is_empty(),
            "authorized_principals cannot be empty",
        )?;
    }
    Ok(())
}

/// Only plaintext passwords are accepted.
pub fn console_passwords(request: &PasswordRequest) -> ValidationResult<()> {
    require(
        !request.accounts.is_empty(),
        "list of username/password pairs cannot be empty",
    )?;
    for entry in &request.accounts {
        stamp(&entry.version, entry.created_on)?;
        require(!entry.account.is_empty(), "name cannot be empty")?;
        match &entry.password {
            None => return Err(ValidationError::malformed("password cannot be empty")),
            Some(Password::Plaintext(p)) if !p.is_empty() => {}
            Some(_) => {
                return Err(ValidationError::malformed(
                    "password must be plaintext; CryptoHash unimplemented",
                ));
            }
        }
    }
    Ok(())
}

pub fn ca_public_keys(request: &CaPublicKeyRequest) -> ValidationResult<()> {
    require(!request.ssh_ca_public_keys.is_empty(), "CA keys cannot be empty")?;
    stamp(&request.version, request.created_on)?;
    for key in &request.ssh_ca_public_keys {
        require(!key.public_key.is_empty(), "CA public key cannot be empty")?;
    }
    Ok(())
}

/// A disabled config carries nothing; an enabled one needs a key, a
/// positive key version and an absolute URL prefix.
pub fn glome(request: &GlomeRequest) -> ValidationResult<()> {
    if !request.enabled {
        if !request.key.is_empty() || request.key_version != 0 || !request.url_prefix.is_empty() {
            let key = if request.key.is_empty() { "" } else { "[REDACTED]" };
            return Err(ValidationError::malformed(format!(
                "GLOME key, key_version, and url_prefix cannot be set if GLOME is disabled, \
                 but received key: {key}, key_version: {}, url_prefix: {}",
                request.key_version, request.url_prefix
            )));
        }
        return Ok(());
    }

    require(!request.key.is_empty(), "GLOME key is empty")?;
    require(request.key_version > 0, "GLOME key version is not valid")?;
    if request.url_prefix.is_empty() {
        return Err(ValidationError::malformed(
            "GLOME URL prefix is not valid: GLOME URL prefix is empty",
        ));
    }
    url::Url::parse(&request.url_prefix)
        .map(|_| ())
        .map_err(|e| ValidationError::invalid_content(format!("GLOME URL prefix is not valid: {e}")))
}
