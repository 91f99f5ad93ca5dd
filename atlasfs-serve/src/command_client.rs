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
use atlasfs_common::{AtlasError, Path};
use atlasfs_naming::{CommandClient, StorageRegistration};
use atlasfs_proto::storage::command_service_client::CommandServiceClient;
use atlasfs_proto::storage::{CreateRequest, StoragePathRequest};

use crate::error::status_to_error;

/// The naming server's view of a storage server's command stub: dials a
/// fresh channel per call rather than holding one open per registration,
/// since registrations in this design are cheap `HostAddr`s, not
/// long-lived client handles (see `DESIGN.md`).
pub struct TonicCommandClient;

#[async_trait]
impl CommandClient for TonicCommandClient {
    async fn create(
        &self,
        registration: &StorageRegistration,
        path: &Path,
        is_directory: bool,
    ) -> Result<bool, AtlasError> {
        let mut client = dial(registration).await?;
        let response = client
            .create(CreateRequest {
                path: path.to_string(),
                is_directory,
            })
            .await
            .map_err(status_to_error)?;
        Ok(response.into_inner().success)
    }

    async fn delete(&self, registration: &StorageRegistration, path: &Path) -> Result<bool, AtlasError> {
        let mut client = dial(registration).await?;
        let response = client
            .delete(StoragePathRequest {
                path: path.to_string(),
            })
            .await
            .map_err(status_to_error)?;
        Ok(response.into_inner().success)
    }
}

async fn dial(
    registration: &StorageRegistration,
) -> Result<CommandServiceClient<tonic::transport::Channel>, AtlasError> {
    CommandServiceClient::connect(registration.command_addr.to_uri())
        .await
        .map_err(|error| AtlasError::RemoteFailure(error.to_string()))
}
