//! Server configuration.
//!
//! Every field has a default matching the device layout, so an empty file
//! (or no file at all) gives a working production config.

use rotor_hostsvc::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Active gRPC authorization policy.
    pub authz_policy_file: PathBuf,
    pub authz_meta_file: PathBuf,
    /// Active pathz policy, read by the gNMI authorizer.
    pub pathz_policy_file: PathBuf,
    pub pathz_meta_file: PathBuf,
    pub ssh_account_meta_file: PathBuf,
    pub ssh_host_meta_file: PathBuf,
    pub console_meta_file: PathBuf,

    /// Deadline for each host service call.
    #[serde(with = "humantime_serde")]
    pub host_call_timeout: Duration,

    /// Deadline for restoring the GLOME config after a failed push.
    #[serde(with = "humantime_serde")]
    pub glome_restore_timeout: Duration,

    /// Load the pathz policy file into the authorizer at startup.
    pub pathz_enforced: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            authz_policy_file: PathBuf::from("/keys/authz_policy.json"),
            authz_meta_file: PathBuf::from("/keys/authz_meta.json"),
            pathz_policy_file: PathBuf::from("/keys/gnmi_pathz.pb.txt"),
            pathz_meta_file: PathBuf::from("/keys/gnmi_pathz_meta.json"),
            ssh_account_meta_file: PathBuf::from("/keys/ssh_account_meta.json"),
            ssh_host_meta_file: PathBuf::from("/keys/ssh_host_meta.json"),
            console_meta_file: PathBuf::from("/keys/console_meta.json"),
            host_call_timeout: Duration::from_secs(10),
            glome_restore_timeout: Duration::from_secs(300),
            pathz_enforced: false,
        }
    }
}

impl ServerConfig {
    /// Load from a `.toml` or `.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let parse_error = |reason: String| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        };
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| parse_error(format!("TOML parse error: {e}")))?,
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| parse_error(format!("JSON parse error: {e}")))?,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };
        config.validate()?;
        tracing::debug!(path = %path.display(), "server config loaded");
        Ok(config)
    }

    /// Put every file under `dir`, keeping the default file names.
    pub fn rooted_at(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let defaults = Self::default();
        let rebase = |p: &Path| match p.file_name() {
            Some(name) => dir.join(name),
            None => dir.to_path_buf(),
        };
        Self {
            authz_policy_file: rebase(&defaults.authz_policy_file),
            authz_meta_file: rebase(&defaults.authz_meta_file),
            pathz_policy_file: rebase(&defaults.pathz_policy_file),
            pathz_meta_file: rebase(&defaults.pathz_meta_file),
            ssh_account_meta_file: rebase(&defaults.ssh_account_meta_file),
            ssh_host_meta_file: rebase(&defaults.ssh_host_meta_file),
            console_meta_file: rebase(&defaults.console_meta_file),
            ..defaults
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.host_call_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "host_call_timeout must be greater than zero".to_string(),
            ));
        }
        if self.glome_restore_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "glome_restore_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_call_timeout(self.host_call_timeout)
            .with_restore_timeout(self.glome_restore_timeout)
    }

    pub fn with_authz_policy_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.authz_policy_file = path.into();
        self
    }

    pub fn with_authz_meta_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.authz_meta_file = path.into();
        self
    }

    pub fn with_pathz_policy_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pathz_policy_file = path.into();
        self
    }

    pub fn with_pathz_meta_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pathz_meta_file = path.into();
        self
    }

    pub fn with_ssh_account_meta_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssh_account_meta_file = path.into();
        self
    }

    pub fn with_ssh_host_meta_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssh_host_meta_file = path.into();
        self
    }

    pub fn with_console_meta_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.console_meta_file = path.into();
        self
    }

    pub fn with_host_call_timeout(mut self, timeout: Duration) -> Self {
        self.host_call_timeout = timeout;
        self
    }

    pub fn with_glome_restore_timeout(mut self, timeout: Duration) -> Self {
        self.glome_restore_timeout = timeout;
        self
    }

    pub fn with_pathz_enforced(mut self, enforced: bool) -> Self {
        self.pathz_enforced = enforced;
        self
    }
}
