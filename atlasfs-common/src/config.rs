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

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::net::HostAddr;

pub const DEFAULT_SERVICE_PORT: u16 = 7280;
pub const DEFAULT_REGISTRATION_PORT: u16 = 7281;
pub const DEFAULT_STORAGE_PORT: u16 = 7380;
pub const DEFAULT_COMMAND_PORT: u16 = 7381;

/// Configuration for a naming server process: where to listen for client
/// directory-service calls and for storage-server registrations.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingServerConfig {
    pub service_listen_addr: HostAddr,
    pub registration_listen_addr: HostAddr,
}

impl Default for NamingServerConfig {
    fn default() -> Self {
        NamingServerConfig {
            service_listen_addr: HostAddr::new("0.0.0.0", DEFAULT_SERVICE_PORT),
            registration_listen_addr: HostAddr::new("0.0.0.0", DEFAULT_REGISTRATION_PORT),
        }
    }
}

/// Configuration for a storage server process.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageServerConfig {
    /// Address this storage server listens on for client data calls.
    pub storage_listen_addr: HostAddr,
    /// Address this storage server listens on for naming-server commands.
    pub command_listen_addr: HostAddr,
    /// Address advertised back to the naming server so it can route
    /// clients here; usually the externally routable counterpart of the
    /// two listen addresses above.
    pub advertised_host: String,
    /// Address of the naming server's registration endpoint.
    pub naming_server_addr: HostAddr,
    /// Local filesystem directory this server's files are rooted at.
    pub local_root: PathBuf,
}

impl Default for StorageServerConfig {
    fn default() -> Self {
        StorageServerConfig {
            storage_listen_addr: HostAddr::new("0.0.0.0", DEFAULT_STORAGE_PORT),
            command_listen_addr: HostAddr::new("0.0.0.0", DEFAULT_COMMAND_PORT),
            advertised_host: "127.0.0.1".to_string(),
            naming_server_addr: HostAddr::new("127.0.0.1", DEFAULT_REGISTRATION_PORT),
            local_root: PathBuf::from("./data"),
        }
    }
}

impl StorageServerConfig {
    pub fn advertised_storage_addr(&self) -> HostAddr {
        HostAddr::new(self.advertised_host.clone(), self.storage_listen_addr.port())
    }

    pub fn advertised_command_addr(&self) -> HostAddr {
        HostAddr::new(self.advertised_host.clone(), self.command_listen_addr.port())
    }
}

/// Loads a config struct from a TOML file, falling back to defaults for
/// any field not present on disk.
pub fn load_toml<T: serde::de::DeserializeOwned + Default>(
    path: &std::path::Path,
) -> anyhow::Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}
