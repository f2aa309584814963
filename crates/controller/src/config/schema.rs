use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_METRICS_PORT: u16 = 9090;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ControllerConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_monasca_url")]
    pub monasca_url: String,
    #[serde(default)]
    pub default_notification: Option<String>,
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,
    #[serde(default = "default_resource_version")]
    pub resource_version: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ControllerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    // A bare host gets the default port.
    pub fn metrics_socket_addr(&self) -> Option<SocketAddr> {
        let addr = self.metrics_addr.trim();
        if let Ok(sock) = addr.parse::<SocketAddr>() {
            return Some(sock);
        }
        let host = addr.trim_start_matches('[').trim_end_matches(']');
        host.parse::<IpAddr>()
            .ok()
            .map(|ip| SocketAddr::new(ip, DEFAULT_METRICS_PORT))
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            namespace: default_namespace(),
            monasca_url: default_monasca_url(),
            default_notification: None,
            metrics_addr: default_metrics_addr(),
            resource_version: default_resource_version(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_poll_interval() -> u64 {
    15
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_monasca_url() -> String {
    "http://monasca-api:8070/v2.0".to_string()
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_resource_version() -> String {
    "v1".to_string()
}

fn default_request_timeout() -> u64 {
    30
}
