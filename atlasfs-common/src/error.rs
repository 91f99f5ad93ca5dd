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

use thiserror::Error;

/// Error taxonomy shared by the naming server and storage servers.
///
/// `AlreadyExists` is deliberately absent: per design, a create operation
/// that targets an already-occupied path reports `false`, not an error.
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("remote call failed: {0}")]
    RemoteFailure(String),
}

impl AtlasError {
    pub fn not_found(path: impl std::fmt::Display) -> Self {
        AtlasError::NotFound(path.to_string())
    }

    pub fn kind(&self) -> AtlasErrorKind {
        match self {
            AtlasError::NotFound(_) => AtlasErrorKind::NotFound,
            AtlasError::IllegalArgument(_) => AtlasErrorKind::IllegalArgument,
            AtlasError::IllegalState(_) => AtlasErrorKind::IllegalState,
            AtlasError::IndexOutOfBounds(_) => AtlasErrorKind::IndexOutOfBounds,
            AtlasError::Io(_) => AtlasErrorKind::Io,
            AtlasError::RemoteFailure(_) => AtlasErrorKind::RemoteFailure,
        }
    }
}

/// The error kind alone, stable across the wire (carried as an integer tag
/// so a gRPC peer can recover it without parsing the message text).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AtlasErrorKind {
    NotFound,
    IllegalArgument,
    IllegalState,
    IndexOutOfBounds,
    Io,
    RemoteFailure,
}

impl AtlasErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AtlasErrorKind::NotFound => "not_found",
            AtlasErrorKind::IllegalArgument => "illegal_argument",
            AtlasErrorKind::IllegalState => "illegal_state",
            AtlasErrorKind::IndexOutOfBounds => "index_out_of_bounds",
            AtlasErrorKind::Io => "io",
            AtlasErrorKind::RemoteFailure => "remote_failure",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        Some(match value {
            "not_found" => AtlasErrorKind::NotFound,
            "illegal_argument" => AtlasErrorKind::IllegalArgument,
            "illegal_state" => AtlasErrorKind::IllegalState,
            "index_out_of_bounds" => AtlasErrorKind::IndexOutOfBounds,
            "io" => AtlasErrorKind::Io,
            "remote_failure" => AtlasErrorKind::RemoteFailure,
            _ => return None,
        })
    }
}
