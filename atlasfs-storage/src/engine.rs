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

use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::Arc;

use atlasfs_common::{AtlasError, Path};
use dashmap::DashMap;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex as AsyncMutex;

/// The local-filesystem-backed storage engine resident on each storage
/// server (spec.md section 4.4). Path translation is textual
/// concatenation of `root` and the logical path's components; there is
/// no metadata sidecar, the filesystem layout *is* the state.
///
/// Each logical path gets its own lock so writers/creators/deleters on
/// one path never block operations on a disjoint path, while still
/// serializing everything that touches the same path (spec.md section 5,
/// "operations on the same path are serialized, on different paths may
/// proceed concurrently"). Modeled on the single-struct-holds-its-root
/// shape of `LocalFileStorage` in `quickwit-storage/src/local_file_storage.rs`,
/// adapted from an object-store client into a read/write/create/delete
/// engine and given per-path locking that store has no need for.
pub struct LocalStore {
    root: PathBuf,
    locks: DashMap<Path, Arc<AsyncMutex<()>>>,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStore {
            root: root.into(),
            locks: DashMap::new(),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn local_path(&self, path: &Path) -> PathBuf {
        let mut local = self.root.clone();
        for component in path.components() {
            local.push(component);
        }
        local
    }

    async fn lock_for(&self, path: &Path) -> Arc<AsyncMutex<()>> {
        self.locks.entry(path.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    pub async fn size(&self, path: &Path) -> Result<i64, AtlasError> {
        let local = self.local_path(path);
        let metadata = fs::metadata(&local).await;
        match metadata {
            Ok(metadata) if metadata.is_file() => Ok(metadata.len() as i64),
            Ok(_) => Err(AtlasError::not_found(path)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Err(AtlasError::not_found(path)),
            Err(error) => Err(AtlasError::Io(error)),
        }
    }

    pub async fn read(&self, path: &Path, offset: i64, length: i64) -> Result<Vec<u8>, AtlasError> {
        if offset < 0 || length < 0 {
            return Err(AtlasError::IndexOutOfBounds(format!(
                "offset ({offset}) and length ({length}) must be non-negative"
            )));
        }
        let lock = self.lock_for(path).await;
        let _guard = lock.lock().await;

        let local = self.local_path(path);
        let mut file = fs::File::open(&local).await.map_err(|error| map_open_error(error, path))?;
        let size = file
            .metadata()
            .await
            .map_err(AtlasError::Io)?
            .len() as i64;
        if offset + length > size {
            return Err(AtlasError::IndexOutOfBounds(format!(
                "read [{offset}, {offset}+{length}) exceeds file size {size} for `{path}`"
            )));
        }
        file.seek(SeekFrom::Start(offset as u64)).await.map_err(AtlasError::Io)?;
        let mut buf = vec![0u8; length as usize];
        file.read_exact(&mut buf).await.map_err(AtlasError::Io)?;
        Ok(buf)
    }

    /// `offset` may be beyond the current end of file; the gap is zero-filled.
    /// Durable before returning: `sync_all` is called before success.
    pub async fn write(&self, path: &Path, offset: i64, data: &[u8]) -> Result<(), AtlasError> {
        if offset < 0 {
            return Err(AtlasError::IndexOutOfBounds(format!(
                "offset ({offset}) must be non-negative"
            )));
        }
        let lock = self.lock_for(path).await;
        let _guard = lock.lock().await;

        let local = self.local_path(path);
        let mut file = OpenOptions::new()
            .write(true)
            .read(true)
            .open(&local)
            .await
            .map_err(|error| map_open_error(error, path))?;
        let current_len = file.metadata().await.map_err(AtlasError::Io)?.len();
        if offset as u64 > current_len {
            file.set_len(offset as u64).await.map_err(AtlasError::Io)?;
        }
        file.seek(SeekFrom::Start(offset as u64)).await.map_err(AtlasError::Io)?;
        file.write_all(data).await.map_err(AtlasError::Io)?;
        file.sync_all().await.map_err(AtlasError::Io)?;
        Ok(())
    }

    /// Creates all missing ancestor directories then the empty file (or
    /// the directory itself, when `is_directory`). Returns `false` if the
    /// path already exists, and `false` (not an error) on I/O failure:
    /// the remote caller only ever sees success/failure.
    pub async fn create(&self, path: &Path, is_directory: bool) -> Result<bool, AtlasError> {
        let lock = self.lock_for(path).await;
        let _guard = lock.lock().await;

        let local = self.local_path(path);
        if let Some(parent) = local.parent() {
            if fs::create_dir_all(parent).await.is_err() {
                return Ok(false);
            }
        }
        if is_directory {
            match fs::create_dir(&local).await {
                Ok(()) => Ok(true),
                Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
                Err(_) => Ok(false),
            }
        } else {
            match OpenOptions::new().write(true).create_new(true).open(&local).await {
                Ok(_) => Ok(true),
                Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
                Err(_) => Ok(false),
            }
        }
    }

    /// Root is rejected. Recurses when `path` names a directory.
    pub async fn delete(&self, path: &Path) -> Result<bool, AtlasError> {
        if path.is_root() {
            return Ok(false);
        }
        let lock = self.lock_for(path).await;
        let _guard = lock.lock().await;

        let local = self.local_path(path);
        match fs::metadata(&local).await {
            Err(_) => Ok(false),
            Ok(metadata) if metadata.is_dir() => Ok(fs::remove_dir_all(&local).await.is_ok()),
            Ok(_) => Ok(fs::remove_file(&local).await.is_ok()),
        }
    }
}

fn map_open_error(error: std::io::Error, path: &Path) -> AtlasError {
    if error.kind() == std::io::ErrorKind::NotFound {
        AtlasError::not_found(path)
    } else {
        AtlasError::Io(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn create_then_size_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(store.create(&path("/a/f.txt"), false).await.unwrap());
        assert_eq!(store.size(&path("/a/f.txt")).await.unwrap(), 0);

        store.write(&path("/a/f.txt"), 10, b"hi").await.unwrap();
        assert_eq!(store.size(&path("/a/f.txt")).await.unwrap(), 12);
        let data = store.read(&path("/a/f.txt"), 10, 2).await.unwrap();
        assert_eq!(data, b"hi");
    }

    #[tokio::test]
    async fn create_twice_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(store.create(&path("/f"), false).await.unwrap());
        assert!(!store.create(&path("/f"), false).await.unwrap());
    }

    #[tokio::test]
    async fn size_of_missing_or_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(matches!(store.size(&path("/missing")).await, Err(AtlasError::NotFound(_))));
        store.create(&path("/dir"), true).await.unwrap();
        assert!(matches!(store.size(&path("/dir")).await, Err(AtlasError::NotFound(_))));
    }

    #[tokio::test]
    async fn read_out_of_bounds_is_index_out_of_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store.create(&path("/f"), false).await.unwrap();
        store.write(&path("/f"), 0, b"abc").await.unwrap();
        assert!(matches!(
            store.read(&path("/f"), 1, 10).await,
            Err(AtlasError::IndexOutOfBounds(_))
        ));
        assert!(matches!(
            store.read(&path("/f"), -1, 1).await,
            Err(AtlasError::IndexOutOfBounds(_))
        ));
    }

    #[tokio::test]
    async fn delete_recurses_into_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store.create(&path("/a/b.txt"), false).await.unwrap();
        assert!(store.delete(&path("/a")).await.unwrap());
        assert!(matches!(store.size(&path("/a/b.txt")).await, Err(AtlasError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_root_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(!store.delete(&path("/")).await.unwrap());
    }
}
