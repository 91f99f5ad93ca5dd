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

use async_trait::async_trait;
use atlasfs_common::{AtlasError, HostAddr, Path};
use atlasfs_proto::naming::registration_service_client::RegistrationServiceClient;
use atlasfs_proto::naming::RegisterRequest;
use atlasfs_storage::NamingClient;

use crate::error::status_to_error;

/// A storage server's view of the naming server's registration endpoint.
pub struct TonicNamingClient {
    naming_server_addr: HostAddr,
}

impl TonicNamingClient {
    pub fn new(naming_server_addr: HostAddr) -> Self {
        TonicNamingClient { naming_server_addr }
    }
}

#[async_trait]
impl NamingClient for TonicNamingClient {
    async fn register(
        &self,
        data_addr: HostAddr,
        command_addr: HostAddr,
        capacity_hint: u64,
        paths: Vec<Path>,
    ) -> Result<Vec<Path>, AtlasError> {
        let mut client = RegistrationServiceClient::connect(self.naming_server_addr.to_uri())
            .await
            .map_err(|error| AtlasError::RemoteFailure(error.to_string()))?;
        let response = client
            .register(RegisterRequest {
                data_addr: data_addr.to_string(),
                command_addr: command_addr.to_string(),
                paths: paths.into_iter().map(|path| path.to_string()).collect(),
                capacity_hint,
            })
            .await
            .map_err(status_to_error)?;
        response
            .into_inner()
            .delete_paths
            .into_iter()
            .map(|raw| raw.parse())
            .collect()
    }
}
