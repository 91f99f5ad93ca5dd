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

use std::path::Path as StdPath;
use std::sync::Arc;

use async_trait::async_trait;
use atlasfs_common::config::StorageServerConfig;
use atlasfs_common::{AtlasError, HostAddr, Path};
use tracing::{info, warn};

use crate::engine::LocalStore;
use crate::prune::prune_empty_dirs;

/// The naming server's registration endpoint, seen from a storage
/// server. Kept as a trait, mirroring `atlasfs_naming::CommandClient`,
/// so bootstrap logic can be unit tested without a real RPC transport;
/// `atlasfs-serve` supplies the tonic-backed implementation.
#[async_trait]
pub trait NamingClient: Send + Sync {
    async fn register(
        &self,
        data_addr: HostAddr,
        command_addr: HostAddr,
        capacity_hint: u64,
        paths: Vec<Path>,
    ) -> Result<Vec<Path>, AtlasError>;
}

/// A storage server: a [`LocalStore`] plus the registration-on-startup
/// sequence from spec.md section 4.4 ("startup prune").
pub struct StorageServer {
    store: Arc<LocalStore>,
    config: StorageServerConfig,
}

impl StorageServer {
    pub fn new(config: StorageServerConfig) -> Self {
        let store = Arc::new(LocalStore::new(config.local_root.clone()));
        StorageServer { store, config }
    }

    pub fn store(&self) -> Arc<LocalStore> {
        self.store.clone()
    }

    pub fn config(&self) -> &StorageServerConfig {
        &self.config
    }

    /// Registers with the naming server, deletes whatever it tells us to
    /// delete, then prunes directories left empty by those deletions.
    /// Capacity hint is reported as the number of bytes free at
    /// `local_root`'s filesystem; `0` if that cannot be determined.
    pub async fn bootstrap(&self, naming_client: &dyn NamingClient) -> Result<(), AtlasError> {
        tokio::fs::create_dir_all(&self.config.local_root)
            .await
            .map_err(AtlasError::Io)?;

        let existing_paths = scan_existing_files(&self.config.local_root).await?;
        info!(count = existing_paths.len(), "scanned existing local files before registering");

        let delete_list = naming_client
            .register(
                self.config.advertised_storage_addr(),
                self.config.advertised_command_addr(),
                capacity_hint(&self.config.local_root),
                existing_paths,
            )
            .await?;

        for path in &delete_list {
            if let Err(error) = self.store.delete(path).await {
                warn!(%path, %error, "failed to delete path named in the registration delete list");
            }
        }
        info!(deleted = delete_list.len(), "pruned paths named by naming server");

        prune_empty_dirs(&self.config.local_root).await;
        Ok(())
    }
}

fn capacity_hint(_root: &StdPath) -> u64 {
    // A real deployment would report free disk space here (e.g. via
    // `statvfs`); none of the example crates in this workspace depend on
    // a crate that exposes that portably, so this is left as a constant
    // placement hint rather than reaching for a new, ungrounded dependency.
    1
}

/// Recursively enumerates every regular file under `root`, translated
/// back into logical [`Path`]s relative to `root` (spec.md section 4.2:
/// a storage server registers "a list of files it already holds").
async fn scan_existing_files(root: &StdPath) -> Result<Vec<Path>, AtlasError> {
    let mut paths = Vec::new();
    scan_recursive(root, root, &mut paths).await?;
    Ok(paths)
}

fn scan_recursive<'a>(
    dir: &'a StdPath,
    root: &'a StdPath,
    out: &'a mut Vec<Path>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), AtlasError>> + Send + 'a>> {
    Box::pin(async move {
        let mut entries = tokio::fs::read_dir(dir).await.map_err(AtlasError::Io)?;
        while let Some(entry) = entries.next_entry().await.map_err(AtlasError::Io)? {
            let file_type = entry.file_type().await.map_err(AtlasError::Io)?;
            if file_type.is_dir() {
                scan_recursive(&entry.path(), root, out).await?;
            } else if file_type.is_file() {
                out.push(to_logical_path(root, &entry.path())?);
            }
        }
        Ok(())
    })
}

fn to_logical_path(root: &StdPath, absolute: &StdPath) -> Result<Path, AtlasError> {
    let relative = absolute.strip_prefix(root).map_err(|_| {
        AtlasError::IllegalState(format!(
            "path `{}` is not rooted under `{}`",
            absolute.display(),
            root.display()
        ))
    })?;
    let mut logical = Path::root();
    for component in relative.components() {
        let name = component.as_os_str().to_str().ok_or_else(|| {
            AtlasError::IllegalState(format!("path `{}` is not valid UTF-8", absolute.display()))
        })?;
        logical = logical.join(name)?;
    }
    Ok(logical)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingNamingClient {
        registered: Mutex<Option<(HostAddr, HostAddr, Vec<Path>)>>,
        delete_list: Vec<Path>,
    }

    #[async_trait]
    impl NamingClient for RecordingNamingClient {
        async fn register(
            &self,
            data_addr: HostAddr,
            command_addr: HostAddr,
            _capacity_hint: u64,
            paths: Vec<Path>,
        ) -> Result<Vec<Path>, AtlasError> {
            *self.registered.lock().unwrap() = Some((data_addr, command_addr, paths));
            Ok(self.delete_list.clone())
        }
    }

    #[tokio::test]
    async fn bootstrap_scans_existing_files_and_prunes_delete_list() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(dir.path().join("a")).await.unwrap();
        tokio::fs::write(dir.path().join("a").join("b.txt"), b"x").await.unwrap();
        tokio::fs::write(dir.path().join("c.txt"), b"y").await.unwrap();

        let mut config = StorageServerConfig::default();
        config.local_root = dir.path().to_path_buf();
        let server = StorageServer::new(config);

        let client = RecordingNamingClient {
            registered: Mutex::new(None),
            delete_list: vec!["/a/b.txt".parse().unwrap()],
        };
        server.bootstrap(&client).await.unwrap();

        let (_, _, mut scanned) = client.registered.lock().unwrap().take().unwrap();
        scanned.sort_by_key(|p| p.to_string());
        assert_eq!(
            scanned.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            vec!["/a/b.txt".to_string(), "/c.txt".to_string()]
        );

        assert!(!dir.path().join("a").join("b.txt").exists());
        assert!(!dir.path().join("a").exists());
        assert!(dir.path().join("c.txt").exists());
    }
}
