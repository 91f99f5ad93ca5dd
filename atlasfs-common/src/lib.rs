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

//! Shared primitives used by both the naming server and storage servers:
//! the [`path::Path`] value type, the [`error::AtlasError`] taxonomy,
//! [`net::HostAddr`] for advertising stubs, and process configuration.

pub mod config;
pub mod error;
pub mod net;
pub mod path;

pub use error::{AtlasError, AtlasErrorKind};
pub use net::HostAddr;
pub use path::Path;
