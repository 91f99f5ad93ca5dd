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

use std::path::PathBuf;
use std::sync::Arc;

use atlasfs_common::config::{load_toml, NamingServerConfig};
use atlasfs_naming::NamingServer;
use clap::Parser;

#[derive(Parser)]
#[clap(about = "AtlasFS naming server")]
struct Args {
    /// Path to a TOML config file; missing fields fall back to defaults.
    #[clap(long, default_value = "naming-server.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    atlasfs_cli::logging::setup_logging(tracing::Level::INFO)?;
    let args = Args::parse();
    let config: NamingServerConfig = load_toml(&args.config)?;

    let server = Arc::new(NamingServer::new());
    atlasfs_serve::run_naming_server(server, &config).await?;
    Ok(())
}
