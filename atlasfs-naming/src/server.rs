// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Mutex;

use atlasfs_common::AtlasError;

use crate::tree::Namespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Stopped,
    Running,
    /// Terminal: a naming server instance is never reusable once stopped.
    Decommissioned,
}

/// Owns a [`Namespace`] plus the `Stopped → Running → Stopped` lifecycle
/// from spec.md section 4.5. Deliberately a plain value rather than a
/// module-level singleton (design notes: "multiple independent naming
/// servers must be able to coexist in one process for testing").
pub struct NamingServer {
    namespace: Namespace,
    lifecycle: Mutex<Lifecycle>,
}

impl Default for NamingServer {
    fn default() -> Self {
        Self::new()
    }
}

impl NamingServer {
    pub fn new() -> Self {
        NamingServer {
            namespace: Namespace::new(),
            lifecycle: Mutex::new(Lifecycle::Stopped),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Transitions `Stopped → Running`. The caller is expected to have
    /// already bound both the service and registration RPC endpoints;
    /// `start` only records the transition, it does not bind sockets
    /// itself. `atlasfs-serve` binds both listeners before calling this,
    /// so a bind failure simply never calls `start` and the instance
    /// stays `Stopped`, matching spec.md section 4.5's "failure on
    /// either restores Stopped".
    pub fn start(&self) -> Result<(), AtlasError> {
        let mut lifecycle = self.lifecycle.lock().unwrap();
        match *lifecycle {
            Lifecycle::Stopped => {
                *lifecycle = Lifecycle::Running;
                Ok(())
            }
            Lifecycle::Running => Err(AtlasError::IllegalState(
                "naming server is already running".to_string(),
            )),
            Lifecycle::Decommissioned => Err(AtlasError::IllegalState(
                "naming server instance was already stopped and cannot be restarted".to_string(),
            )),
        }
    }

    /// Transitions `Running → Decommissioned`, permanently: the instance
    /// may not be started again afterwards. Spec.md section 4.5 only
    /// specifies the `Stopped → Running` transition's failure behavior;
    /// it is silent on what a *running* server does if serving itself
    /// fails later. Making that terminal (rather than looping back to a
    /// restartable `Stopped`) was chosen to match "once stopped, the
    /// instance is not reusable" — treating an abnormal exit from
    /// `Running` the same as a normal one.
    pub fn stop(&self) -> Result<(), AtlasError> {
        let mut lifecycle = self.lifecycle.lock().unwrap();
        match *lifecycle {
            Lifecycle::Running => {
                *lifecycle = Lifecycle::Decommissioned;
                Ok(())
            }
            Lifecycle::Stopped => Err(AtlasError::IllegalState(
                "naming server is not running".to_string(),
            )),
            Lifecycle::Decommissioned => Err(AtlasError::IllegalState(
                "naming server was already stopped".to_string(),
            )),
        }
    }

    pub fn is_running(&self) -> bool {
        *self.lifecycle.lock().unwrap() == Lifecycle::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_round_trip_and_no_restart() {
        let server = NamingServer::new();
        assert!(!server.is_running());
        server.start().unwrap();
        assert!(server.is_running());
        server.stop().unwrap();
        assert!(!server.is_running());

        let err = server.start().unwrap_err();
        assert!(matches!(err, AtlasError::IllegalState(_)));
    }

    #[test]
    fn double_start_is_illegal_state() {
        let server = NamingServer::new();
        server.start().unwrap();
        let err = server.start().unwrap_err();
        assert!(matches!(err, AtlasError::IllegalState(_)));
    }

    #[test]
    fn stop_before_start_is_illegal_state() {
        let server = NamingServer::new();
        let err = server.stop().unwrap_err();
        assert!(matches!(err, AtlasError::IllegalState(_)));
    }
}
