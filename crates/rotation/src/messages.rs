//! Rotation RPC messages.
//!
//! Plain serde mirrors of the gNSI `authz`, `pathz` and `credentialz`
//! Rotate streams. Field names are snake_case and defaults are emitted.

use rotor_pathz::AuthorizationPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;

// ── authz ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotateAuthzRequest {
    pub request: Option<AuthzRequest>,
    #[serde(default)]
    pub force_overwrite: bool,
}

impl RotateAuthzRequest {
    pub fn upload(version: impl Into<String>, created_on: u64, policy: impl Into<String>) -> Self {
        Self {
            request: Some(AuthzRequest::Upload(UploadRequest {
                version: version.into(),
                created_on,
                policy: policy.into(),
            })),
            force_overwrite: false,
        }
    }

    pub fn finalize() -> Self {
        Self {
            request: Some(AuthzRequest::Finalize),
            force_overwrite: false,
        }
    }

    pub fn forced(mut self) -> Self {
        self.force_overwrite = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthzRequest {
    Upload(UploadRequest),
    Finalize,
}

/// A policy upload: an opaque document plus its version stamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub created_on: u64,
    #[serde(default)]
    pub policy: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotateAuthzResponse {
    pub upload: UploadResponse,
}

// ── pathz ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotatePathzRequest {
    pub request: Option<PathzRequest>,
    #[serde(default)]
    pub force_overwrite: bool,
}

impl RotatePathzRequest {
    pub fn upload(version: impl Into<String>, created_on: u64, policy: AuthorizationPolicy) -> Self {
        Self {
            request: Some(PathzRequest::Upload(PathzUpload {
                version: version.into(),
                created_on,
                policy,
            })),
            force_overwrite: false,
        }
    }

    pub fn finalize() -> Self {
        Self {
            request: Some(PathzRequest::Finalize),
            force_overwrite: false,
        }
    }

    pub fn forced(mut self) -> Self {
        self.force_overwrite = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathzRequest {
    Upload(PathzUpload),
    Finalize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathzUpload {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub created_on: u64,
    #[serde(default)]
    pub policy: AuthorizationPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotatePathzResponse {
    pub upload: UploadResponse,
}

// ── credentialz: shared ───────────────────────────────────────────────────

/// SSH key algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    #[default]
    Unspecified,
    EcdsaP256,
    EcdsaP521,
    Ed25519,
    Rsa2048,
    Rsa4096,
}

impl KeyType {
    /// Algorithm prefix of an `authorized_keys` line.
    pub fn ssh_prefix(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::EcdsaP256 => "ecdsa-sha2-nistp256",
            Self::EcdsaP521 => "ecdsa-sha2-nistp521",
            Self::Ed25519 => "ssh-ed25519",
            Self::Rsa2048 | Self::Rsa4096 => "ssh-rsa",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyOption {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

// ── credentialz: RotateAccountCredentials ─────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotateAccountCredentialsRequest {
    Credential(AuthorizedKeysRequest),
    User(AuthorizedUsersRequest),
    Password(PasswordRequest),
    Finalize,
}

impl RotateAccountCredentialsRequest {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Credential(_) => "Credential",
            Self::User(_) => "User",
            Self::Password(_) => "Password",
            Self::Finalize => "Finalize",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedKeysRequest {
    #[serde(default)]
    pub credentials: Vec<AccountCredentials>,
}

/// Authorized keys for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCredentials {
    pub account: String,
    #[serde(default)]
    pub authorized_keys: Vec<AuthorizedKey>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub created_on: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedKey {
    /// Raw key blob, base64-encoded on the way to the host service.
    pub authorized_key: Vec<u8>,
    #[serde(default)]
    pub key_type: KeyType,
    #[serde(default)]
    pub options: Vec<KeyOption>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedUsersRequest {
    #[serde(default)]
    pub policies: Vec<UserPolicy>,
}

/// Authorized principals for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPolicy {
    pub account: String,
    #[serde(default)]
    pub authorized_principals: Vec<AuthorizedPrincipal>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub created_on: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedPrincipal {
    pub authorized_user: String,
    #[serde(default)]
    pub options: Vec<KeyOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordRequest {
    #[serde(default)]
    pub accounts: Vec<ConsoleAccount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleAccount {
    pub account: String,
    pub password: Option<Password>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub created_on: u64,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Password {
    Plaintext(String),
    CryptoHash { hash_type: String, hash_value: String },
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plaintext(_) => f.write_str("Plaintext([REDACTED])"),
            Self::CryptoHash { hash_type, .. } => f
                .debug_struct("CryptoHash")
                .field("hash_type", hash_type)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotateAccountCredentialsResponse {
    Credential,
    User,
    Password,
}

// ── credentialz: RotateHostParameters ─────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotateHostParametersRequest {
    SshCaPublicKey(CaPublicKeyRequest),
    Glome(GlomeRequest),
    ServerKeys,
    GenerateKeys,
    AuthenticationAllowed,
    AuthorizedPrincipalCheck,
    Finalize,
}

impl RotateHostParametersRequest {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SshCaPublicKey(_) => "SshCaPublicKey",
            Self::Glome(_) => "Glome",
            Self::ServerKeys => "ServerKeys",
            Self::GenerateKeys => "GenerateKeys",
            Self::AuthenticationAllowed => "AuthenticationAllowed",
            Self::AuthorizedPrincipalCheck => "AuthorizedPrincipalCheck",
            Self::Finalize => "Finalize",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaPublicKeyRequest {
    #[serde(default)]
    pub ssh_ca_public_keys: Vec<PublicKey>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub created_on: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub public_key: Vec<u8>,
    #[serde(default)]
    pub key_type: KeyType,
    #[serde(default)]
    pub description: String,
}

/// GLOME URL-signing configuration.
///
/// Serialized as-is, all fields present, for the host service's
/// `push_config` call.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlomeRequest {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub key_version: i32,
    #[serde(default)]
    pub url_prefix: String,
}

impl fmt::Debug for GlomeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlomeRequest")
            .field("enabled", &self.enabled)
            .field("key", &"[REDACTED]")
            .field("key_version", &self.key_version)
            .field("url_prefix", &self.url_prefix)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotateHostParametersResponse {
    SshCaPublicKey,
    Glome,
}

// ── unary placeholders ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRequest {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResponse {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRequest {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResponse {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanGenerateKeyRequest {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanGenerateKeyResponse {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPublicKeysRequest {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPublicKeysResponse {}
