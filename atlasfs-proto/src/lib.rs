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

//! Generated gRPC client/server code for the naming and storage surfaces
//! of `spec.md` section 6. `build.rs` regenerates these modules from the
//! `.proto` files on every build; nothing in here is hand-written.

pub mod naming {
    include!("atlasfs.naming.rs");
}

pub mod storage {
    include!("atlasfs.storage.rs");
}

pub use tonic;
