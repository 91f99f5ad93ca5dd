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

use std::env;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Initializes `tracing` with an `EnvFilter`, honoring `RUST_LOG` and
/// otherwise defaulting to `level` for the `atlasfs` target prefix.
/// Trimmed down from `quickwit-cli::main::setup_logging_and_tracing`: no
/// Jaeger/OpenTelemetry exporter and no jemalloc metrics loop, neither of
/// which this crate has any use for.
pub fn setup_logging(level: tracing::Level) -> anyhow::Result<()> {
    let env_filter = env::var("RUST_LOG")
        .map(|_| EnvFilter::from_default_env())
        .or_else(|_| EnvFilter::try_new(format!("atlasfs={level}")))
        .context("failed to set up tracing env filter")?;
    tracing_subscriber::fmt().with_env_filter(env_filter).try_init().ok();
    Ok(())
}
