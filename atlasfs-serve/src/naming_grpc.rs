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

use std::sync::Arc;

use atlasfs_common::AtlasError;
use atlasfs_naming::{CommandClient, NamingServer};
use atlasfs_proto::naming::naming_service_server::NamingService;
use atlasfs_proto::naming::registration_service_server::RegistrationService;
use atlasfs_proto::naming::{
    CreateResponse, DeleteResponse, GetStorageResponse, IsDirectoryResponse, ListResponse,
    PathRequest, RegisterRequest, RegisterResponse,
};
use tonic::{Request, Response, Status};

use crate::error::error_to_status;

fn parse_path(raw: &str) -> Result<atlasfs_common::Path, Status> {
    raw.parse().map_err(|error: AtlasError| error_to_status(&error))
}

/// Implements the client-facing `NamingService` RPC surface on top of a
/// [`NamingServer`]'s namespace, mapping [`AtlasError`] onto `tonic::Status`
/// the same way `GrpcMetastoreServiceAdapter` does in
/// `quickwit-serve/src/metastore_api/grpc_adapter.rs`: every method is a
/// thin delegation to the wrapped local service.
pub struct GrpcNamingServiceAdapter {
    server: Arc<NamingServer>,
    command_client: Arc<dyn CommandClient>,
}

impl GrpcNamingServiceAdapter {
    pub fn new(server: Arc<NamingServer>, command_client: Arc<dyn CommandClient>) -> Self {
        GrpcNamingServiceAdapter {
            server,
            command_client,
        }
    }
}

#[tonic::async_trait]
impl NamingService for GrpcNamingServiceAdapter {
    async fn is_directory(&self, request: Request<PathRequest>) -> Result<Response<IsDirectoryResponse>, Status> {
        let path = parse_path(&request.into_inner().path)?;
        let is_directory = self
            .server
            .namespace()
            .is_directory(&path)
            .map_err(|error| error_to_status(&error))?;
        Ok(Response::new(IsDirectoryResponse { is_directory }))
    }

    async fn list(&self, request: Request<PathRequest>) -> Result<Response<ListResponse>, Status> {
        let path = parse_path(&request.into_inner().path)?;
        let names = self
            .server
            .namespace()
            .list(&path)
            .map_err(|error| error_to_status(&error))?;
        Ok(Response::new(ListResponse { names }))
    }

    async fn create_file(&self, request: Request<PathRequest>) -> Result<Response<CreateResponse>, Status> {
        let path = parse_path(&request.into_inner().path)?;
        let created = self
            .server
            .namespace()
            .create_file(&path, self.command_client.as_ref())
            .await
            .map_err(|error| error_to_status(&error))?;
        Ok(Response::new(CreateResponse { created }))
    }

    async fn create_directory(&self, request: Request<PathRequest>) -> Result<Response<CreateResponse>, Status> {
        let path = parse_path(&request.into_inner().path)?;
        let created = self
            .server
            .namespace()
            .create_directory(&path, self.command_client.as_ref())
            .await
            .map_err(|error| error_to_status(&error))?;
        Ok(Response::new(CreateResponse { created }))
    }

    async fn delete(&self, request: Request<PathRequest>) -> Result<Response<DeleteResponse>, Status> {
        let path = parse_path(&request.into_inner().path)?;
        let deleted = self
            .server
            .namespace()
            .delete(&path, self.command_client.as_ref())
            .await
            .map_err(|error| error_to_status(&error))?;
        Ok(Response::new(DeleteResponse { deleted }))
    }

    async fn get_storage(&self, request: Request<PathRequest>) -> Result<Response<GetStorageResponse>, Status> {
        let path = parse_path(&request.into_inner().path)?;
        let data_addr = self
            .server
            .namespace()
            .get_storage(&path)
            .map_err(|error| error_to_status(&error))?;
        Ok(Response::new(GetStorageResponse {
            data_addr: data_addr.to_string(),
        }))
    }
}

/// Implements the storage-server-facing `RegistrationService`.
pub struct GrpcRegistrationServiceAdapter {
    server: Arc<NamingServer>,
}

impl GrpcRegistrationServiceAdapter {
    pub fn new(server: Arc<NamingServer>) -> Self {
        GrpcRegistrationServiceAdapter { server }
    }
}

#[tonic::async_trait]
impl RegistrationService for GrpcRegistrationServiceAdapter {
    async fn register(&self, request: Request<RegisterRequest>) -> Result<Response<RegisterResponse>, Status> {
        let request = request.into_inner();
        let data_addr = atlasfs_common::HostAddr::parse_with_default_port(&request.data_addr, 0)
            .map_err(|error| Status::invalid_argument(error.to_string()))?;
        let command_addr = atlasfs_common::HostAddr::parse_with_default_port(&request.command_addr, 0)
            .map_err(|error| Status::invalid_argument(error.to_string()))?;
        let paths = request
            .paths
            .iter()
            .map(|raw| parse_path(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let delete_paths = self
            .server
            .namespace()
            .register(data_addr, command_addr, request.capacity_hint, paths)
            .map_err(|error| error_to_status(&error))?
            .into_iter()
            .map(|path| path.to_string())
            .collect();
        Ok(Response::new(RegisterResponse { delete_paths }))
    }
}
