use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// System configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(rename = "conf_version")]
    #[serde(default = "default_conf_version")]
    pub conf_version: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound for a single hosted-model HTTP call
    #[serde(rename = "request_timeout_secs")]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Largest accepted `message` payload, in bytes
    #[serde(rename = "max_message_bytes")]
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

fn default_conf_version() -> String {
    "v1.0.0".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_message_bytes() -> usize {
    1024 * 1024
}

impl SystemConfig {
    /// Resolve the listen address. Unparseable hosts fall back to all interfaces.
    pub fn socket_addr(&self) -> SocketAddr {
        let ip = self
            .host
            .parse::<IpAddr>()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        SocketAddr::new(ip, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            conf_version: default_conf_version(),
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_8080() {
        let config = SystemConfig::default();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn hostname_falls_back_to_unspecified() {
        let config = SystemConfig {
            host: "localhost".to_string(),
            port: 9000,
            ..SystemConfig::default()
        };
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
    }
}
