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

use tracing::warn;

/// Walks `root` bottom-up and removes every directory left empty, without
/// ever removing `root` itself. Tolerates concurrent filesystem changes:
/// a directory that disappears mid-walk, or a transient I/O error on a
/// single directory, is logged and skipped rather than treated as fatal.
///
/// Modeled on `LocalFileStorage::delete_all_dirs` in
/// `quickwit-storage/src/local_file_storage.rs`, which walks a path's
/// ancestors removing each if (and only if) it has become empty,
/// tolerating a concurrent `NotFound` and never deleting past its root.
/// This is the same bottom-up, best-effort shape applied to a whole
/// subtree instead of a single ancestor chain.
pub async fn prune_empty_dirs(root: &StdPath) {
    let _ = prune_recursive(root, root).await;
}

fn prune_recursive<'a>(
    dir: &'a StdPath,
    root: &'a StdPath,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = bool> + Send + 'a>> {
    Box::pin(async move {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(path = %dir.display(), %error, "failed to read directory during prune");
                return false;
            }
        };

        let mut is_empty = true;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(error) => {
                    warn!(path = %dir.display(), %error, "failed to iterate directory during prune");
                    is_empty = false;
                    break;
                }
            };
            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(_) => {
                    is_empty = false;
                    continue;
                }
            };
            if file_type.is_dir() {
                if prune_recursive(&entry.path(), root).await {
                    // the child removed itself; it no longer counts against `is_empty`
                } else {
                    is_empty = false;
                }
            } else {
                is_empty = false;
            }
        }

        if !is_empty || dir == root {
            return false;
        }
        match tokio::fs::remove_dir(dir).await {
            Ok(()) => true,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => true,
            Err(error) => {
                warn!(path = %dir.display(), %error, "failed to remove empty directory during prune");
                false
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn removes_nested_empty_directories_but_not_root() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        tokio::fs::create_dir_all(&nested).await.unwrap();

        prune_empty_dirs(dir.path()).await;

        assert!(dir.path().exists());
        assert!(!dir.path().join("a").exists());
    }

    #[tokio::test]
    async fn keeps_directories_that_still_contain_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        tokio::fs::create_dir_all(&nested).await.unwrap();
        tokio::fs::write(dir.path().join("a").join("f.txt"), b"x").await.unwrap();

        prune_empty_dirs(dir.path()).await;

        assert!(dir.path().join("a").exists());
        assert!(!dir.path().join("a").join("b").exists());
    }
}
