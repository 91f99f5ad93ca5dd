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

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AtlasError;

/// An absolute, normalized path in the AtlasFS namespace.
///
/// A [`Path`] is a sequence of non-empty components, none of which may
/// contain `/` or `:`. The root path has zero components and renders as
/// `/`. Equality and hashing are derived from the component vector, not
/// from any particular string encoding, so two [`Path`]s built from
/// differently-spelled but canonically-equal strings compare equal.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    components: Vec<String>,
}

impl Path {
    /// The root path, `/`.
    pub fn root() -> Self {
        Path {
            components: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// The path's parent. Fails with [`AtlasError::IllegalArgument`] on root.
    pub fn parent(&self) -> Result<Path, AtlasError> {
        if self.is_root() {
            return Err(AtlasError::IllegalArgument(
                "root path has no parent".to_string(),
            ));
        }
        let mut components = self.components.clone();
        components.pop();
        Ok(Path { components })
    }

    /// The path's last component. Fails with [`AtlasError::IllegalArgument`] on root.
    pub fn last(&self) -> Result<&str, AtlasError> {
        self.components
            .last()
            .map(String::as_str)
            .ok_or_else(|| AtlasError::IllegalArgument("root path has no last component".to_string()))
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.components.len()
    }

    /// Returns a new path obtained by appending `name` as a child component.
    pub fn join(&self, name: &str) -> Result<Path, AtlasError> {
        validate_component(name)?;
        let mut components = self.components.clone();
        components.push(name.to_string());
        Ok(Path { components })
    }

    /// `self` is a subpath of `other` iff `other`'s components are a
    /// prefix of `self`'s. Per the design notes, this is a component-wise
    /// comparison, not substring containment (`/ab` must not appear to be
    /// a subpath of `/a`).
    pub fn is_subpath_of(&self, other: &Path) -> bool {
        if other.components.len() > self.components.len() {
            return false;
        }
        self.components
            .iter()
            .zip(other.components.iter())
            .all(|(a, b)| a == b)
    }

    /// Iterator over this path's ancestors, from the immediate parent up to
    /// (and including) the root, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = Path> + '_ {
        (0..self.components.len()).rev().map(|len| Path {
            components: self.components[..len].to_vec(),
        })
    }
}

fn validate_component(component: &str) -> Result<(), AtlasError> {
    if component.is_empty() {
        return Err(AtlasError::IllegalArgument(
            "path component must not be empty".to_string(),
        ));
    }
    if component.contains('/') || component.contains(':') {
        return Err(AtlasError::IllegalArgument(format!(
            "path component `{component}` must not contain `/` or `:`"
        )));
    }
    Ok(())
}

impl fmt::Display for Path {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(formatter, "/");
        }
        for component in &self.components {
            write!(formatter, "/{component}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = AtlasError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if !raw.starts_with('/') {
            return Err(AtlasError::IllegalArgument(format!(
                "path `{raw}` must be absolute"
            )));
        }
        if raw == "/" {
            return Ok(Path::root());
        }
        let mut components = Vec::new();
        for component in raw[1..].split('/') {
            validate_component(component)?;
            components.push(component.to_string());
        }
        Ok(Path { components })
    }
}

impl TryFrom<String> for Path {
    type Error = AtlasError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<&str> for Path {
    type Error = AtlasError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_renders_as_slash() {
        assert_eq!(Path::root().to_string(), "/");
        assert!(Path::root().is_root());
    }

    #[test]
    fn parses_and_renders_round_trip() {
        let path: Path = "/a/b/c".parse().unwrap();
        assert_eq!(path.to_string(), "/a/b/c");
        assert_eq!(path.components().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn rejects_relative_and_malformed_paths() {
        assert!("a/b".parse::<Path>().is_err());
        assert!("/a//b".parse::<Path>().is_err());
        assert!("/a:b".parse::<Path>().is_err());
        assert!("".parse::<Path>().is_err());
    }

    #[test]
    fn parent_and_last_fail_on_root() {
        assert!(Path::root().parent().is_err());
        assert!(Path::root().last().is_err());
        let path: Path = "/a/b".parse().unwrap();
        assert_eq!(path.parent().unwrap().to_string(), "/a");
        assert_eq!(path.last().unwrap(), "b");
    }

    #[test]
    fn subpath_is_component_wise_not_substring() {
        let ab: Path = "/ab".parse().unwrap();
        let a: Path = "/a".parse().unwrap();
        // `/ab` must not be considered a subpath of `/a`: this is the bug
        // called out against substring-based containment checks.
        assert!(!ab.is_subpath_of(&a));

        let a_b: Path = "/a/b".parse().unwrap();
        assert!(a_b.is_subpath_of(&a));
        assert!(a.is_subpath_of(&Path::root()));
    }

    #[test]
    fn ancestors_walk_up_to_root() {
        let path: Path = "/a/b/c".parse().unwrap();
        let ancestors: Vec<String> = path.ancestors().map(|p| p.to_string()).collect();
        assert_eq!(ancestors, vec!["/a/b", "/a", "/"]);
    }
}
