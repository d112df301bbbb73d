//! Scripted in-process host service for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use crate::caller::HostServiceCaller;
use crate::error::{HostServiceError, HostServiceResult};
use crate::method::{HostAction, HostMethod, HostService};

/// One call observed by [`FakeHostService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: HostMethod,
    pub payload: String,
}

/// Fake daemon with the real checkpoint semantics.
///
/// Each service's state is the list of payloads applied to it. A checkpoint
/// copies that list; restore puts it back. `push_config` replaces the
/// service's checkpoint with the state it overwrites, the way the GLOME
/// service does.
#[derive(Default)]
pub struct FakeHostService {
    state: Mutex<HashMap<HostService, Vec<String>>>,
    checkpoints: Mutex<HashMap<HostService, Vec<String>>>,
    calls: Mutex<Vec<RecordedCall>>,
    fail_next: Mutex<Vec<(HostAction, String)>>,
    fail_always: Mutex<HashMap<HostAction, String>>,
    delay: Option<Duration>,
}

impl FakeHostService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Preload a service's state.
    pub fn seed(&self, service: HostService, payloads: Vec<String>) {
        self.state.lock().insert(service, payloads);
    }

    /// Fail the next call with `action` once.
    pub fn fail_next(&self, action: HostAction, message: &str) {
        self.fail_next.lock().push((action, message.to_string()));
    }

    /// Fail every call with `action` until cleared.
    pub fn fail_always(&self, action: HostAction, message: &str) {
        self.fail_always.lock().insert(action, message.to_string());
    }

    pub fn clear_failures(&self) {
        self.fail_next.lock().clear();
        self.fail_always.lock().clear();
    }

    pub fn state(&self, service: HostService) -> Vec<String> {
        self.state.lock().get(&service).cloned().unwrap_or_default()
    }

    pub fn has_checkpoint(&self, service: HostService) -> bool {
        self.checkpoints.lock().contains_key(&service)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Actions called on `service`, in order.
    pub fn actions(&self, service: HostService) -> Vec<HostAction> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.method.service == service)
            .map(|c| c.method.action)
            .collect()
    }

    fn scripted_failure(&self, action: HostAction) -> Option<String> {
        if let Some(message) = self.fail_always.lock().get(&action) {
            return Some(message.clone());
        }
        let mut pending = self.fail_next.lock();
        let index = pending.iter().position(|(a, _)| *a == action)?;
        Some(pending.remove(index).1)
    }

    fn apply(&self, method: &HostMethod, payload: &str) -> Result<(), String> {
        let service = method.service;
        let mut state = self.state.lock();
        let mut checkpoints = self.checkpoints.lock();
        match method.action {
            HostAction::CreateCheckpoint => {
                if checkpoints.contains_key(&service) {
                    return Err("checkpoint already exists".to_string());
                }
                let current = state.get(&service).cloned().unwrap_or_default();
                checkpoints.insert(service, current);
            }
            HostAction::DeleteCheckpoint => {
                if checkpoints.remove(&service).is_none() {
                    return Err("no checkpoint to delete".to_string());
                }
            }
            HostAction::RestoreCheckpoint => match checkpoints.remove(&service) {
                Some(saved) => {
                    state.insert(service, saved);
                }
                None if service == HostService::Glome => {}
                None => return Err("no checkpoint to restore".to_string()),
            },
            HostAction::Set => {
                state.entry(service).or_default().push(payload.to_string());
            }
            HostAction::PushConfig => {
                let current = state.get(&service).cloned().unwrap_or_default();
                checkpoints.insert(service, current);
                state.insert(service, vec![payload.to_string()]);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl HostServiceCaller for FakeHostService {
    async fn call(&self, method: &HostMethod, payload: &str) -> HostServiceResult<String> {
        self.calls.lock().push(RecordedCall {
            method: *method,
            payload: payload.to_string(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self
            .scripted_failure(method.action)
            .map_or_else(|| self.apply(method, payload), Err);
        outcome.map(|()| String::new()).map_err(|message| HostServiceError::Call {
            method: method.name(),
            message,
        })
    }
}
