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

//! gRPC transport for AtlasFS: turns `atlasfs-naming`'s [`NamingServer`]
//! and `atlasfs-storage`'s [`StorageServer`] into the four RPC endpoints
//! of spec.md section 6, using tonic. Wiring follows the
//! bind-then-`add_service`-then-`serve_with_incoming` shape of
//! `quickwit-serve/src/grpc.rs`, adapted so each endpoint gets its own
//! listener: spec.md's naming-server lifecycle transitions to `Running`
//! only once *both* its endpoints are listening, so both listeners are
//! bound up front before the transition is recorded.

pub mod command_client;
pub mod error;
pub mod naming_client;
pub mod naming_grpc;
pub mod storage_grpc;

use std::sync::Arc;

use atlasfs_common::config::{NamingServerConfig, StorageServerConfig};
use atlasfs_common::AtlasError;
use atlasfs_naming::{CommandClient, NamingServer};
use atlasfs_proto::naming::naming_service_server::NamingServiceServer;
use atlasfs_proto::naming::registration_service_server::RegistrationServiceServer;
use atlasfs_proto::storage::command_service_server::CommandServiceServer;
use atlasfs_proto::storage::storage_service_server::StorageServiceServer;
use atlasfs_storage::{NamingClient, StorageServer};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::info;

pub use command_client::TonicCommandClient;
pub use naming_client::TonicNamingClient;

async fn bind(addr: &atlasfs_common::HostAddr) -> Result<TcpListener, AtlasError> {
    let socket_addr = addr
        .to_socket_addr()
        .await
        .map_err(|error| AtlasError::RemoteFailure(error.to_string()))?;
    TcpListener::bind(socket_addr).await.map_err(AtlasError::Io)
}

/// Binds both naming-server endpoints, transitions the server to
/// `Running`, and serves until either endpoint fails. A bind failure
/// happens before `start` is ever called, so the instance simply stays
/// `Stopped`; a failure after `Running` is recorded as `Decommissioned`
/// (terminal either way, see [`NamingServer::stop`]).
pub async fn run_naming_server(server: Arc<NamingServer>, config: &NamingServerConfig) -> Result<(), AtlasError> {
    let service_listener = bind(&config.service_listen_addr).await?;
    let registration_listener = bind(&config.registration_listen_addr).await?;
    server.start()?;
    info!(
        service_addr = %config.service_listen_addr,
        registration_addr = %config.registration_listen_addr,
        "naming server listening"
    );

    let command_client: Arc<dyn CommandClient> = Arc::new(TonicCommandClient);
    let naming_adapter = naming_grpc::GrpcNamingServiceAdapter::new(server.clone(), command_client);
    let registration_adapter = naming_grpc::GrpcRegistrationServiceAdapter::new(server.clone());

    let service_future = Server::builder()
        .add_service(NamingServiceServer::new(naming_adapter))
        .serve_with_incoming(TcpListenerStream::new(service_listener));
    let registration_future = Server::builder()
        .add_service(RegistrationServiceServer::new(registration_adapter))
        .serve_with_incoming(TcpListenerStream::new(registration_listener));

    let result = tokio::try_join!(service_future, registration_future);
    let _ = server.stop();
    result
        .map(|_| ())
        .map_err(|error| AtlasError::RemoteFailure(error.to_string()))
}

/// Binds both storage-server endpoints, serves them in the background,
/// then registers with the naming server and runs the startup prune
/// (spec.md section 4.4).
pub async fn run_storage_server(storage_server: Arc<StorageServer>) -> Result<(), AtlasError> {
    let config: StorageServerConfig = storage_server.config().clone();
    let storage_listener = bind(&config.storage_listen_addr).await?;
    let command_listener = bind(&config.command_listen_addr).await?;
    info!(
        storage_addr = %config.storage_listen_addr,
        command_addr = %config.command_listen_addr,
        "storage server listening"
    );

    let store = storage_server.store();
    let storage_adapter = storage_grpc::GrpcStorageServiceAdapter::new(store.clone());
    let command_adapter = storage_grpc::GrpcCommandServiceAdapter::new(store);

    let storage_future = Server::builder()
        .add_service(StorageServiceServer::new(storage_adapter))
        .serve_with_incoming(TcpListenerStream::new(storage_listener));
    let command_future = Server::builder()
        .add_service(CommandServiceServer::new(command_adapter))
        .serve_with_incoming(TcpListenerStream::new(command_listener));

    let serve_storage = tokio::spawn(storage_future);
    let serve_command = tokio::spawn(command_future);

    // The listeners are already accepting connections once the tasks
    // above are spawned, so it's safe to register with the naming server
    // now: a command call it makes while registering will be served.
    let naming_client: Arc<dyn NamingClient> = Arc::new(TonicNamingClient::new(config.naming_server_addr.clone()));
    storage_server.bootstrap(naming_client.as_ref()).await?;

    let (storage_result, command_result) = tokio::try_join!(serve_storage, serve_command)
        .map_err(|error| AtlasError::RemoteFailure(error.to_string()))?;
    storage_result.map_err(|error| AtlasError::RemoteFailure(error.to_string()))?;
    command_result.map_err(|error| AtlasError::RemoteFailure(error.to_string()))?;
    Ok(())
}
