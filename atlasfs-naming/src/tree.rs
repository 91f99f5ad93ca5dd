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

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use atlasfs_common::{AtlasError, HostAddr, Path};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::placement;
use crate::registration::StorageRegistration;

/// A peer a [`Namespace`] calls out to when it needs a storage server to
/// actually create or delete a path (spec.md section 4.1: `createFile`
/// and `delete` issue remote `create`/`delete` calls to a command stub).
/// Kept as a trait so the tree itself stays transport-free and unit
/// testable; `atlasfs-serve` supplies the tonic-backed implementation.
#[async_trait]
pub trait CommandClient: Send + Sync {
    async fn create(
        &self,
        registration: &StorageRegistration,
        path: &Path,
        is_directory: bool,
    ) -> Result<bool, AtlasError>;
    async fn delete(&self, registration: &StorageRegistration, path: &Path) -> Result<bool, AtlasError>;
}

/// A named interior node of the namespace tree: a set of child file names
/// and a map from child directory name to child [`DirectoryNode`]. The
/// two are kept disjoint (spec.md section 3, invariant on `DirectoryNode`).
#[derive(Debug, Default)]
struct DirectoryNode {
    files: HashSet<String>,
    dirs: HashMap<String, DirectoryNode>,
}

enum Lookup<'a> {
    Directory(&'a DirectoryNode),
    File,
}

impl DirectoryNode {
    /// Collects the full paths of every file and sub-directory nested
    /// under this node, `prefix` being this node's own path.
    fn collect_descendants(&self, prefix: &Path, out: &mut Vec<Path>) {
        for file in &self.files {
            out.push(prefix.join(file).expect("file name was already validated"));
        }
        for (name, child) in &self.dirs {
            let child_path = prefix.join(name).expect("dir name was already validated");
            child.collect_descendants(&child_path, out);
            out.push(child_path);
        }
    }

    fn walk<'a>(&'a self, components: &[&str], path: &Path) -> Result<Lookup<'a>, AtlasError> {
        match components.split_first() {
            None => Ok(Lookup::Directory(self)),
            Some((head, rest)) => {
                if let Some(child) = self.dirs.get(*head) {
                    child.walk(rest, path)
                } else if self.files.contains(*head) {
                    if rest.is_empty() {
                        Ok(Lookup::File)
                    } else {
                        Err(AtlasError::not_found(path))
                    }
                } else {
                    Err(AtlasError::not_found(path))
                }
            }
        }
    }
}

struct NamespaceInner {
    root: DirectoryNode,
    server_files: HashSet<Path>,
    stubs_by_path: HashMap<Path, Vec<Arc<StorageRegistration>>>,
    registrations: Vec<Arc<StorageRegistration>>,
}

impl NamespaceInner {
    fn new() -> Self {
        NamespaceInner {
            root: DirectoryNode::default(),
            server_files: HashSet::new(),
            stubs_by_path: HashMap::new(),
            registrations: Vec::new(),
        }
    }

    /// Inserts `path` (a file when `is_file`, a directory otherwise) into
    /// the tree and the auxiliary indexes, creating any missing ancestor
    /// directory nodes. Every freshly created ancestor also gets
    /// `registration` recorded in `stubs_by_path` (spec.md section 4.2,
    /// step 3: "record `(dataStub, commandStub)` under every created
    /// ancestor path and under the surviving path itself") and is added
    /// to `server_files`, which spec.md section 3 defines as covering
    /// "files and directories" alike; omitting ancestors would make
    /// `create`'s parent check reject every child of a freshly registered
    /// directory.
    ///
    /// Returns `Err` without mutating anything if an ancestor of `path`
    /// is already known as a *file*: inserting `path` would require that
    /// ancestor to be a directory, which would violate the invariant that
    /// a path is either a file or a directory, never both. The documented
    /// registration algorithm does not spell out this case, but silently
    /// corrupting the tree is worse than refusing the insert.
    fn insert(&mut self, path: &Path, is_file: bool, registration: Arc<StorageRegistration>) -> Result<(), ()> {
        let components: Vec<&str> = path.components().collect();
        let (last, ancestors) = components
            .split_last()
            .expect("insert is never called with the root path");

        let mut node = &mut self.root;
        let mut prefix = Path::root();
        let mut created_ancestors = Vec::new();
        for component in ancestors {
            if node.files.contains(*component) {
                return Err(());
            }
            prefix = prefix.join(component).expect("component already validated");
            if !node.dirs.contains_key(*component) {
                node.dirs.insert((*component).to_string(), DirectoryNode::default());
                created_ancestors.push(prefix.clone());
            }
            node = node.dirs.get_mut(*component).expect("just inserted or already present");
        }
        if node.files.contains(*last) {
            return Err(());
        }

        if is_file {
            node.files.insert((*last).to_string());
        } else if !node.dirs.contains_key(*last) {
            node.dirs.insert((*last).to_string(), DirectoryNode::default());
        }

        for ancestor in created_ancestors {
            self.server_files.insert(ancestor.clone());
            self.stubs_by_path
                .entry(ancestor)
                .or_default()
                .push(registration.clone());
        }
        self.server_files.insert(path.clone());
        self.stubs_by_path
            .entry(path.clone())
            .or_default()
            .push(registration);
        Ok(())
    }

    /// Removes `path` from the tree and both auxiliary indexes. If `path`
    /// is a directory, every path nested under it is purged from
    /// `server_files`/`stubs_by_path` too, since the single remote
    /// `delete` call issued for `path` recursively removes the
    /// corresponding subtree on the storage side (spec.md section 4.4).
    /// Assumes the caller has already verified `path` is known.
    fn remove(&mut self, path: &Path) {
        let components: Vec<&str> = path.components().collect();
        let (last, ancestors) = components
            .split_last()
            .expect("remove is never called with the root path");

        let mut node = &self.root;
        for component in ancestors {
            match node.dirs.get(*component) {
                Some(child) => node = child,
                None => return,
            }
        }
        let mut descendants = Vec::new();
        if let Some(removed_dir) = node.dirs.get(*last) {
            removed_dir.collect_descendants(path, &mut descendants);
        }

        let mut node = &mut self.root;
        for component in ancestors {
            node = node.dirs.get_mut(*component).expect("walked above");
        }
        node.files.remove(*last);
        node.dirs.remove(*last);

        self.server_files.remove(path);
        self.stubs_by_path.remove(path);
        for descendant in descendants {
            self.server_files.remove(&descendant);
            self.stubs_by_path.remove(&descendant);
        }
    }
}

/// The namespace tree owned by the naming server: a directory tree plus
/// the `serverFiles`/`stubsByPath` indexes, guarded by a single lock so
/// readers never observe a half-updated state (spec.md section 5).
pub struct Namespace {
    inner: RwLock<NamespaceInner>,
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

impl Namespace {
    pub fn new() -> Self {
        Namespace {
            inner: RwLock::new(NamespaceInner::new()),
        }
    }

    pub fn is_directory(&self, path: &Path) -> Result<bool, AtlasError> {
        if path.is_root() {
            return Ok(true);
        }
        let inner = self.inner.read();
        let components: Vec<&str> = path.components().collect();
        match inner.root.walk(&components, path)? {
            Lookup::Directory(_) => Ok(true),
            Lookup::File => Ok(false),
        }
    }

    pub fn list(&self, path: &Path) -> Result<Vec<String>, AtlasError> {
        let inner = self.inner.read();
        let components: Vec<&str> = path.components().collect();
        let node = if path.is_root() {
            &inner.root
        } else {
            match inner.root.walk(&components, path)? {
                Lookup::Directory(node) => node,
                Lookup::File => return Err(AtlasError::not_found(path)),
            }
        };
        let mut names: Vec<String> = node.files.iter().cloned().collect();
        names.extend(node.dirs.keys().cloned());
        Ok(names)
    }

    pub fn get_storage(&self, path: &Path) -> Result<HostAddr, AtlasError> {
        let inner = self.inner.read();
        let stubs = inner
            .stubs_by_path
            .get(path)
            .ok_or_else(|| AtlasError::not_found(path))?;
        let chosen = placement::route(stubs).expect("stubsByPath entries are never empty");
        Ok(chosen.data_addr.clone())
    }

    /// spec.md section 4.2: accepts a storage server's registration and
    /// returns the delete list it must prune locally.
    pub fn register(
        &self,
        data_addr: HostAddr,
        command_addr: HostAddr,
        capacity_hint: u64,
        incoming_paths: Vec<Path>,
    ) -> Result<Vec<Path>, AtlasError> {
        let mut inner = self.inner.write();
        if inner
            .registrations
            .iter()
            .any(|registration| registration.same_endpoints(&data_addr, &command_addr))
        {
            return Err(AtlasError::IllegalState(format!(
                "storage server ({data_addr}, {command_addr}) is already registered"
            )));
        }
        let registration = Arc::new(StorageRegistration::new(data_addr, command_addr, capacity_hint));
        inner.registrations.push(registration.clone());

        let incoming_count = incoming_paths.len();
        let mut delete_list = Vec::new();
        for path in incoming_paths {
            if path.is_root() {
                continue;
            }
            let already_exists = inner.server_files.contains(&path);
            let shadows_existing_subtree = !already_exists
                && inner
                    .server_files
                    .iter()
                    .any(|existing| existing.is_subpath_of(&path));
            if already_exists || shadows_existing_subtree {
                delete_list.push(path);
                continue;
            }
            if inner.insert(&path, true, registration.clone()).is_err() {
                // An ancestor of `path` is already a file: the storage
                // server's inventory conflicts with the namespace the
                // same way a direct collision would.
                delete_list.push(path);
            }
        }
        info!(
            data_addr = %registration.data_addr,
            incoming = incoming_count,
            deleted = delete_list.len(),
            "reconciled storage server registration"
        );
        Ok(delete_list)
    }

    pub async fn create_file(&self, path: &Path, client: &dyn CommandClient) -> Result<bool, AtlasError> {
        self.create(path, true, client).await
    }

    pub async fn create_directory(&self, path: &Path, client: &dyn CommandClient) -> Result<bool, AtlasError> {
        self.create(path, false, client).await
    }

    async fn create(&self, path: &Path, is_file: bool, client: &dyn CommandClient) -> Result<bool, AtlasError> {
        if path.is_root() {
            return Err(AtlasError::IllegalArgument("cannot create the root path".to_string()));
        }
        let parent = path.parent()?;
        let registration = {
            let inner = self.inner.read();
            if !parent.is_root() && !inner.server_files.contains(&parent) {
                return Err(AtlasError::not_found(&parent));
            }
            if inner.server_files.contains(path) {
                return Ok(false);
            }
            placement::choose_server(&inner.registrations)
                .ok_or_else(|| AtlasError::not_found(path))?
        };

        let created = client.create(&registration, path, !is_file).await?;
        if !created {
            return Ok(false);
        }

        let mut inner = self.inner.write();
        if inner.server_files.contains(path) {
            // Lost a race against a concurrent create of the same path.
            return Ok(false);
        }
        inner
            .insert(path, is_file, registration)
            .map_err(|()| AtlasError::IllegalState(format!("path `{path}` conflicts with an existing file")))?;
        Ok(true)
    }

    /// spec.md section 4.1: issues `delete` to every command stub
    /// registered for `path`, aborting on the first failure, then removes
    /// `path` from the tree and both indexes on success.
    pub async fn delete(&self, path: &Path, client: &dyn CommandClient) -> Result<bool, AtlasError> {
        if path.is_root() {
            return Ok(false);
        }
        let (registrations, exists) = {
            let inner = self.inner.read();
            (
                inner.stubs_by_path.get(path).cloned().unwrap_or_default(),
                inner.server_files.contains(path),
            )
        };
        if !exists {
            return Err(AtlasError::not_found(path));
        }
        for registration in &registrations {
            match client.delete(registration, path).await {
                Ok(true) => {}
                Ok(false) => return Ok(false),
                Err(error) => {
                    warn!(%path, %error, "remote delete failed");
                    return Err(error);
                }
            }
        }
        self.inner.write().remove(path);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingClient {
        created: Mutex<Vec<(HostAddr, String)>>,
        deleted: Mutex<Vec<(HostAddr, String)>>,
        create_result: Mutex<bool>,
        delete_result: Mutex<bool>,
    }

    impl RecordingClient {
        fn new(create_result: bool, delete_result: bool) -> Self {
            RecordingClient {
                created: Mutex::new(Vec::new()),
                deleted: Mutex::new(Vec::new()),
                create_result: Mutex::new(create_result),
                delete_result: Mutex::new(delete_result),
            }
        }
    }

    #[async_trait]
    impl CommandClient for RecordingClient {
        async fn create(
            &self,
            registration: &StorageRegistration,
            path: &Path,
            _is_directory: bool,
        ) -> Result<bool, AtlasError> {
            self.created
                .lock()
                .unwrap()
                .push((registration.command_addr.clone(), path.to_string()));
            Ok(*self.create_result.lock().unwrap())
        }

        async fn delete(&self, registration: &StorageRegistration, path: &Path) -> Result<bool, AtlasError> {
            self.deleted
                .lock()
                .unwrap()
                .push((registration.command_addr.clone(), path.to_string()));
            Ok(*self.delete_result.lock().unwrap())
        }
    }

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    #[test]
    fn scenario_register_two_servers() {
        let ns = Namespace::new();
        let delete_list = ns
            .register(
                HostAddr::new("10.0.0.1", 9000),
                HostAddr::new("10.0.0.1", 9001),
                1,
                vec![path("/a/b.txt"), path("/c/d.txt")],
            )
            .unwrap();
        assert!(delete_list.is_empty());
        assert_eq!(sorted(ns.list(&path("/")).unwrap()), vec!["a", "c"]);
        assert_eq!(sorted(ns.list(&path("/a")).unwrap()), vec!["b.txt"]);
        assert!(!ns.is_directory(&path("/a/b.txt")).unwrap());

        let delete_list = ns
            .register(
                HostAddr::new("10.0.0.2", 9000),
                HostAddr::new("10.0.0.2", 9001),
                1,
                vec![path("/a/b.txt"), path("/e.txt")],
            )
            .unwrap();
        assert_eq!(delete_list, vec![path("/a/b.txt")]);
        assert_eq!(sorted(ns.list(&path("/")).unwrap()), vec!["a", "c", "e.txt"]);
        let data_addr = ns.get_storage(&path("/e.txt")).unwrap();
        assert_eq!(data_addr, HostAddr::new("10.0.0.2", 9000));
    }

    #[test]
    fn duplicate_registration_is_illegal_state() {
        let ns = Namespace::new();
        let data = HostAddr::new("10.0.0.1", 9000);
        let cmd = HostAddr::new("10.0.0.1", 9001);
        ns.register(data.clone(), cmd.clone(), 1, vec![]).unwrap();
        let err = ns.register(data, cmd, 1, vec![]).unwrap_err();
        assert!(matches!(err, AtlasError::IllegalState(_)));
    }

    #[test]
    fn registration_prefix_collision_within_same_batch_keeps_first() {
        let ns = Namespace::new();
        let delete_list = ns
            .register(
                HostAddr::new("10.0.0.1", 9000),
                HostAddr::new("10.0.0.1", 9001),
                1,
                vec![path("/a"), path("/a/b")],
            )
            .unwrap();
        assert_eq!(delete_list, vec![path("/a/b")]);
        assert!(!ns.is_directory(&path("/a")).unwrap());
    }

    #[tokio::test]
    async fn create_file_requires_parent_and_routes_via_placement() {
        let ns = Namespace::new();
        ns.register(
            HostAddr::new("10.0.0.1", 9000),
            HostAddr::new("10.0.0.1", 9001),
            1,
            vec![path("/a/b.txt")],
        )
        .unwrap();
        ns.register(
            HostAddr::new("10.0.0.2", 9000),
            HostAddr::new("10.0.0.2", 9001),
            100,
            vec![],
        )
        .unwrap();

        let client = RecordingClient::new(true, true);
        let created = ns.create_file(&path("/a/new.txt"), &client).await.unwrap();
        assert!(created);
        assert_eq!(sorted(ns.list(&path("/a")).unwrap()), vec!["b.txt", "new.txt"]);
        assert_eq!(
            client.created.lock().unwrap().as_slice(),
            &[(HostAddr::new("10.0.0.2", 9001), "/a/new.txt".to_string())]
        );
    }

    #[tokio::test]
    async fn create_file_under_missing_parent_is_not_found_without_remote_call() {
        let ns = Namespace::new();
        let client = RecordingClient::new(true, true);
        let err = ns
            .create_file(&path("/does/not/exist/x"), &client)
            .await
            .unwrap_err();
        assert!(matches!(err, AtlasError::NotFound(_)));
        assert!(client.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_calls_every_stub_and_removes_path() {
        let ns = Namespace::new();
        ns.register(
            HostAddr::new("10.0.0.1", 9000),
            HostAddr::new("10.0.0.1", 9001),
            1,
            vec![path("/a/b.txt")],
        )
        .unwrap();
        let client = RecordingClient::new(true, true);
        let deleted = ns.delete(&path("/a"), &client).await.unwrap();
        assert!(deleted);
        assert!(matches!(
            ns.is_directory(&path("/a")),
            Err(AtlasError::NotFound(_))
        ));
        assert!(matches!(ns.list(&path("/")).unwrap().as_slice(), names if !names.contains(&"a".to_string())));
    }

    #[tokio::test]
    async fn delete_of_directory_purges_descendant_indexes() {
        let ns = Namespace::new();
        ns.register(
            HostAddr::new("10.0.0.1", 9000),
            HostAddr::new("10.0.0.1", 9001),
            1,
            vec![path("/a/b.txt"), path("/a/c/d.txt")],
        )
        .unwrap();
        let client = RecordingClient::new(true, true);
        assert!(ns.delete(&path("/a"), &client).await.unwrap());

        assert!(matches!(
            ns.get_storage(&path("/a/b.txt")),
            Err(AtlasError::NotFound(_))
        ));
        assert!(matches!(
            ns.get_storage(&path("/a/c/d.txt")),
            Err(AtlasError::NotFound(_))
        ));
        // Only the directory's own stub list was called, not each descendant's.
        assert_eq!(client.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_root_is_refused() {
        let ns = Namespace::new();
        let client = RecordingClient::new(true, true);
        assert!(!ns.delete(&path("/"), &client).await.unwrap());
    }

    fn sorted(mut names: Vec<String>) -> Vec<String> {
        names.sort();
        names
    }
}
