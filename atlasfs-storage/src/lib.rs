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

//! The storage engine (SE) resident on each storage server: local-file
//! read/write/create/delete, startup reconciliation with the naming
//! server, and empty-directory pruning (spec.md section 4.4).

pub mod engine;
pub mod prune;
pub mod server;

pub use engine::LocalStore;
pub use server::{NamingClient, StorageServer};
