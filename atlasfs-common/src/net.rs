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

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tokio::net::lookup_host;

/// A host, i.e. an IP address (`127.0.0.1`) or a hostname (`storage-1`).
#[derive(Clone, Debug)]
pub enum Host {
    Hostname(String),
    IpAddr(IpAddr),
}

impl Host {
    /// Returns a resolved host, i.e. an IP address.
    pub async fn resolve(&self) -> anyhow::Result<IpAddr> {
        match self {
            Host::IpAddr(ip_addr) => Ok(*ip_addr),
            Host::Hostname(hostname) => lookup_host((hostname.as_str(), 0u16))
                .await
                .with_context(|| format!("failed to resolve hostname `{hostname}`"))?
                .next()
                .map(|socket_addr| socket_addr.ip())
                .ok_or_else(|| {
                    anyhow::anyhow!("DNS resolution did not yield any record for `{hostname}`")
                }),
        }
    }
}

impl Display for Host {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Host::Hostname(hostname) => hostname.fmt(formatter),
            Host::IpAddr(ip_addr) => ip_addr.fmt(formatter),
        }
    }
}

/// An address `<host>:<port>`, used to advertise a server's own stubs back
/// to its peers rather than a loopback address. The naming server hands
/// these to clients as the result of `getStorage`; storage servers hand
/// one to the naming server at `register` time.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostAddr {
    host: String,
    port: u16,
}

impl HostAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        HostAddr {
            host: host.into(),
            port,
        }
    }

    /// Parses `host_addr`, falling back to `default_port` when none is given.
    pub fn parse_with_default_port(host_addr: &str, default_port: u16) -> anyhow::Result<Self> {
        if let Ok(socket_addr) = host_addr.parse::<SocketAddr>() {
            return Ok(HostAddr {
                host: socket_addr.ip().to_string(),
                port: socket_addr.port(),
            });
        }
        if let Ok(ip_addr) = host_addr.parse::<IpAddr>() {
            return Ok(HostAddr {
                host: ip_addr.to_string(),
                port: default_port,
            });
        }
        if let Some((hostname, port_str)) = host_addr.rsplit_once(':') {
            let port = port_str
                .parse::<u16>()
                .with_context(|| format!("failed to parse host address `{host_addr}`"))?;
            return Ok(HostAddr {
                host: hostname.to_string(),
                port,
            });
        }
        Ok(HostAddr {
            host: host_addr.to_string(),
            port: default_port,
        })
    }

    pub async fn to_socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let host = if let Ok(ip_addr) = self.host.parse::<IpAddr>() {
            Host::IpAddr(ip_addr)
        } else {
            Host::Hostname(self.host.clone())
        };
        Ok(SocketAddr::new(host.resolve().await?, self.port))
    }

    /// The URI a client dials to reach this endpoint, e.g. `http://storage-1:7070`.
    pub fn to_uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Display for HostAddr {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.host, self.port)
    }
}

impl PartialEq for HostAddr {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl Eq for HostAddr {}

impl std::hash::Hash for HostAddr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.port.hash(state);
    }
}

impl TryFrom<String> for HostAddr {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        HostAddr::parse_with_default_port(&value, 0)
    }
}

impl From<HostAddr> for String {
    fn from(addr: HostAddr) -> Self {
        addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ip_and_hostname_with_and_without_port() {
        assert_eq!(
            HostAddr::parse_with_default_port("127.0.0.1", 1337)
                .unwrap()
                .to_string(),
            "127.0.0.1:1337"
        );
        assert_eq!(
            HostAddr::parse_with_default_port("127.0.0.1:100", 1337)
                .unwrap()
                .to_string(),
            "127.0.0.1:100"
        );
        assert_eq!(
            HostAddr::parse_with_default_port("storage-1:7070", 1337)
                .unwrap()
                .to_string(),
            "storage-1:7070"
        );
        assert_eq!(
            HostAddr::parse_with_default_port("storage-1", 1337)
                .unwrap()
                .to_string(),
            "storage-1:1337"
        );
    }
}
