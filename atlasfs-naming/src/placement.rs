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

use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::registration::StorageRegistration;

/// Picks the storage server that should receive a newly created file or
/// directory: the registration with the largest capacity hint, first
/// registered wins ties. Kept as a single free function so placement
/// stays pluggable, per the design notes ("the reimplementation should
/// keep placement pluggable behind a single function `chooseServer`").
///
/// Returns `None` when no storage server is registered.
pub fn choose_server(
    registrations: &[Arc<StorageRegistration>],
) -> Option<Arc<StorageRegistration>> {
    registrations
        .iter()
        .max_by_key(|registration| registration.capacity_hint())
        .cloned()
}

/// Picks one of the storage servers known to hold `path`, uniformly at
/// random, for routing a client's `getStorage` call. Safe to call
/// concurrently: the caller passes an owned snapshot of the stub list, so
/// there is nothing here to tear.
pub fn route(stubs: &[Arc<StorageRegistration>]) -> Option<Arc<StorageRegistration>> {
    stubs.choose(&mut rand::thread_rng()).cloned()
}

#[cfg(test)]
mod tests {
    use atlasfs_common::HostAddr;

    use super::*;

    fn registration(data_port: u16, capacity: u64) -> Arc<StorageRegistration> {
        Arc::new(StorageRegistration::new(
            HostAddr::new("127.0.0.1", data_port),
            HostAddr::new("127.0.0.1", data_port + 1),
            capacity,
        ))
    }

    #[test]
    fn chooses_largest_capacity_hint() {
        let small = registration(9000, 1);
        let big = registration(9002, 100);
        let registrations = vec![small.clone(), big.clone()];
        let chosen = choose_server(&registrations).unwrap();
        assert!(chosen.same_endpoints(&big.data_addr, &big.command_addr));
    }

    #[test]
    fn no_registrations_yields_none() {
        assert!(choose_server(&[]).is_none());
    }

    #[test]
    fn route_picks_one_of_the_registered_stubs() {
        let a = registration(9000, 1);
        let b = registration(9002, 1);
        let stubs = vec![a.clone(), b.clone()];
        for _ in 0..20 {
            let chosen = route(&stubs).unwrap();
            assert!(
                chosen.same_endpoints(&a.data_addr, &a.command_addr)
                    || chosen.same_endpoints(&b.data_addr, &b.command_addr)
            );
        }
    }
}
