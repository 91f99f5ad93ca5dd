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

//! The naming server: namespace tree (NT), registration and
//! reconciliation (RR), and placement/routing (PR) from spec.md
//! section 4. Transport-free; `atlasfs-serve` wraps [`server::NamingServer`]
//! behind gRPC.

pub mod placement;
pub mod registration;
pub mod server;
pub mod tree;

pub use registration::StorageRegistration;
pub use server::NamingServer;
pub use tree::{CommandClient, Namespace};
