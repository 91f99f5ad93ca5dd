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
use atlasfs_proto::storage::command_service_server::CommandService;
use atlasfs_proto::storage::storage_service_server::StorageService;
use atlasfs_proto::storage::{
    CommandResponse, CreateRequest, ReadRequest, ReadResponse, SizeResponse, StoragePathRequest,
    WriteRequest, WriteResponse,
};
use atlasfs_storage::LocalStore;
use tonic::{Request, Response, Status};

use crate::error::error_to_status;

fn parse_path(raw: &str) -> Result<atlasfs_common::Path, Status> {
    raw.parse().map_err(|error: AtlasError| error_to_status(&error))
}

/// Implements the client-facing `StorageService` data surface on top of a
/// [`LocalStore`].
pub struct GrpcStorageServiceAdapter {
    store: Arc<LocalStore>,
}

impl GrpcStorageServiceAdapter {
    pub fn new(store: Arc<LocalStore>) -> Self {
        GrpcStorageServiceAdapter { store }
    }
}

#[tonic::async_trait]
impl StorageService for GrpcStorageServiceAdapter {
    async fn size(&self, request: Request<StoragePathRequest>) -> Result<Response<SizeResponse>, Status> {
        let path = parse_path(&request.into_inner().path)?;
        let size = self.store.size(&path).await.map_err(|error| error_to_status(&error))?;
        Ok(Response::new(SizeResponse { size }))
    }

    async fn read(&self, request: Request<ReadRequest>) -> Result<Response<ReadResponse>, Status> {
        let request = request.into_inner();
        let path = parse_path(&request.path)?;
        let data = self
            .store
            .read(&path, request.offset, request.length)
            .await
            .map_err(|error| error_to_status(&error))?;
        Ok(Response::new(ReadResponse { data }))
    }

    async fn write(&self, request: Request<WriteRequest>) -> Result<Response<WriteResponse>, Status> {
        let request = request.into_inner();
        let path = parse_path(&request.path)?;
        self.store
            .write(&path, request.offset, &request.data)
            .await
            .map_err(|error| error_to_status(&error))?;
        Ok(Response::new(WriteResponse {}))
    }
}

/// Implements the naming-server-facing `CommandService` surface.
pub struct GrpcCommandServiceAdapter {
    store: Arc<LocalStore>,
}

impl GrpcCommandServiceAdapter {
    pub fn new(store: Arc<LocalStore>) -> Self {
        GrpcCommandServiceAdapter { store }
    }
}

#[tonic::async_trait]
impl CommandService for GrpcCommandServiceAdapter {
    async fn create(&self, request: Request<CreateRequest>) -> Result<Response<CommandResponse>, Status> {
        let request = request.into_inner();
        let path = parse_path(&request.path)?;
        let success = self
            .store
            .create(&path, request.is_directory)
            .await
            .map_err(|error| error_to_status(&error))?;
        Ok(Response::new(CommandResponse { success }))
    }

    async fn delete(&self, request: Request<StoragePathRequest>) -> Result<Response<CommandResponse>, Status> {
        let path = parse_path(&request.into_inner().path)?;
        let success = self.store.delete(&path).await.map_err(|error| error_to_status(&error))?;
        Ok(Response::new(CommandResponse { success }))
    }
}
