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

use atlasfs_common::{AtlasError, AtlasErrorKind};
use serde::{Deserialize, Serialize};

/// Wire encoding of an [`AtlasError`] carried inside a [`tonic::Status`]'s
/// message, so the client gets back the original error kind rather than
/// just a flattened string. Modeled on `parse_grpc_error`/`convert_error`
/// in `quickwit-control-plane/src/metastore_service.rs`, which JSON-encodes
/// a structured error into the status message and decodes it back out on
/// the client side, falling back to a generic error when the message
/// isn't JSON (e.g. an error raised by tonic itself, not by our service).
#[derive(Serialize, Deserialize)]
struct WireError {
    kind: String,
    message: String,
}

pub fn error_to_status(error: &AtlasError) -> tonic::Status {
    let wire = WireError {
        kind: error.kind().as_str().to_string(),
        message: error.to_string(),
    };
    let message = serde_json::to_string(&wire).unwrap_or_else(|_| error.to_string());
    let code = match error.kind() {
        AtlasErrorKind::NotFound => tonic::Code::NotFound,
        AtlasErrorKind::IllegalArgument => tonic::Code::InvalidArgument,
        AtlasErrorKind::IllegalState => tonic::Code::FailedPrecondition,
        AtlasErrorKind::IndexOutOfBounds => tonic::Code::OutOfRange,
        AtlasErrorKind::Io | AtlasErrorKind::RemoteFailure => tonic::Code::Internal,
    };
    tonic::Status::new(code, message)
}

pub fn status_to_error(status: tonic::Status) -> AtlasError {
    if let Ok(wire) = serde_json::from_str::<WireError>(status.message()) {
        if let Some(kind) = AtlasErrorKind::from_str(&wire.kind) {
            return match kind {
                AtlasErrorKind::NotFound => AtlasError::NotFound(wire.message),
                AtlasErrorKind::IllegalArgument => AtlasError::IllegalArgument(wire.message),
                AtlasErrorKind::IllegalState => AtlasError::IllegalState(wire.message),
                AtlasErrorKind::IndexOutOfBounds => AtlasError::IndexOutOfBounds(wire.message),
                AtlasErrorKind::Io | AtlasErrorKind::RemoteFailure => AtlasError::RemoteFailure(wire.message),
            };
        }
    }
    AtlasError::RemoteFailure(status.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_status() {
        let original = AtlasError::NotFound("/a/b".to_string());
        let status = error_to_status(&original);
        assert_eq!(status.code(), tonic::Code::NotFound);
        let decoded = status_to_error(status);
        assert!(matches!(decoded, AtlasError::NotFound(message) if message == "/a/b"));
    }

    #[test]
    fn non_json_status_falls_back_to_remote_failure() {
        let status = tonic::Status::new(tonic::Code::Unavailable, "connection refused");
        let decoded = status_to_error(status);
        assert!(matches!(decoded, AtlasError::RemoteFailure(_)));
    }
}
