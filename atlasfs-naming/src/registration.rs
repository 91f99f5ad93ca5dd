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

use std::sync::atomic::{AtomicU64, Ordering};

use atlasfs_common::HostAddr;

/// A registered storage server: its data stub address, its command stub
/// address, and a mutable capacity hint used only for placement
/// tie-breaking (spec.md section 3). The hint is advisory and may be read
/// without locking (spec.md section 5).
#[derive(Debug)]
pub struct StorageRegistration {
    pub data_addr: HostAddr,
    pub command_addr: HostAddr,
    capacity_hint: AtomicU64,
}

impl StorageRegistration {
    pub fn new(data_addr: HostAddr, command_addr: HostAddr, capacity_hint: u64) -> Self {
        StorageRegistration {
            data_addr,
            command_addr,
            capacity_hint: AtomicU64::new(capacity_hint),
        }
    }

    pub fn capacity_hint(&self) -> u64 {
        self.capacity_hint.load(Ordering::Relaxed)
    }

    pub fn set_capacity_hint(&self, value: u64) {
        self.capacity_hint.store(value, Ordering::Relaxed);
    }

    /// Two registrations identify the same storage server iff both their
    /// data and command stubs match; neither alone is sufficient (spec.md
    /// section 4.2 and the design notes' "registration duplicate
    /// detection" rule).
    pub fn same_endpoints(&self, data_addr: &HostAddr, command_addr: &HostAddr) -> bool {
        &self.data_addr == data_addr && &self.command_addr == command_addr
    }
}
