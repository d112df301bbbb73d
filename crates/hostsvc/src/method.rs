use serde::{Deserialize, Serialize};
use std::fmt;

/// Bus-name and interface prefix shared by every host service.
pub const NAME_PREFIX: &str = "org.SONiC.HostService.";
/// Object-path prefix shared by every host service.
pub const PATH_PREFIX: &str = "/org/SONiC/HostService/";

/// Backend service owning one slice of host configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostService {
    /// SSH authorized keys, principals and trusted CA keys.
    SshMgmt,
    /// Console account passwords.
    GnsiConsole,
    /// GLOME URL-signing configuration.
    Glome,
}

impl HostService {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SshMgmt => "ssh_mgmt",
            Self::GnsiConsole => "gnsi_console",
            Self::Glome => "glome",
        }
    }

    pub fn bus_name(&self) -> String {
        format!("{NAME_PREFIX}{}", self.as_str())
    }

    pub fn bus_path(&self) -> String {
        format!("{PATH_PREFIX}{}", self.as_str())
    }
}

impl fmt::Display for HostService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation exposed by every (or, for `PushConfig`, the GLOME) service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostAction {
    CreateCheckpoint,
    DeleteCheckpoint,
    RestoreCheckpoint,
    Set,
    PushConfig,
}

impl HostAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateCheckpoint => "create_checkpoint",
            Self::DeleteCheckpoint => "delete_checkpoint",
            Self::RestoreCheckpoint => "restore_checkpoint",
            Self::Set => "set",
            Self::PushConfig => "push_config",
        }
    }
}

/// A fully-qualified host service method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostMethod {
    pub service: HostService,
    pub action: HostAction,
}

impl HostMethod {
    pub const fn new(service: HostService, action: HostAction) -> Self {
        Self { service, action }
    }

    /// Interface method name, e.g. `org.SONiC.HostService.glome.push_config`.
    pub fn name(&self) -> String {
        format!("{NAME_PREFIX}{}.{}", self.service.as_str(), self.action.as_str())
    }
}

impl fmt::Display for HostMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
