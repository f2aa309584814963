use std::path::PathBuf;

use clap::Parser;

use crate::config::{load_from_file, validate, ControllerConfig, LoadError};

#[derive(Debug, Parser)]
#[command(
    name = "alarm-definition-controller",
    version,
    about = "Keeps Monasca alarm definitions in sync with AlarmDefinition resources"
)]
pub struct Args {
    #[arg(short, long, env = "ADC_CONFIG", help = "Path to a YAML config file")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "POLL_INTERVAL", help = "Polling interval in seconds")]
    pub poll_interval: Option<u64>,

    #[arg(long, env = "NAMESPACE", help = "Namespace to watch for definitions")]
    pub namespace: Option<String>,

    #[arg(long = "monasca", env = "MONASCA_API_URL", help = "URI of the Monasca API")]
    pub monasca_url: Option<String>,

    #[arg(
        long,
        env = "DEFAULT_NOTIFICATION",
        help = "Notification method applied to new definitions without alarm actions"
    )]
    pub default_notification: Option<String>,

    #[arg(long, env = "PROMETHEUS_ENDPOINT", help = "Address for /metrics and health checks")]
    pub metrics_addr: Option<String>,

    #[arg(long, env = "VERSION", help = "Version of the AlarmDefinition resource")]
    pub resource_version: Option<String>,

    #[arg(long, env = "REQUEST_TIMEOUT", help = "HTTP request timeout in seconds")]
    pub request_timeout: Option<u64>,
}

impl Args {
    pub fn resolve(&self) -> Result<ControllerConfig, LoadError> {
        let mut cfg = match self.config {
            Some(ref path) => load_from_file(path)?,
            None => ControllerConfig::default(),
        };

        if let Some(secs) = self.poll_interval {
            cfg.poll_interval_seconds = secs;
        }
        if let Some(ref ns) = self.namespace {
            cfg.namespace = ns.clone();
        }
        if let Some(ref url) = self.monasca_url {
            cfg.monasca_url = url.clone();
        }
        if let Some(ref name) = self.default_notification {
            cfg.default_notification = Some(name.clone());
        }
        if let Some(ref addr) = self.metrics_addr {
            cfg.metrics_addr = addr.clone();
        }
        if let Some(ref version) = self.resource_version {
            cfg.resource_version = version.clone();
        }
        if let Some(secs) = self.request_timeout {
            cfg.request_timeout_seconds = secs;
        }
        if cfg.default_notification.as_deref() == Some("") {
            cfg.default_notification = None;
        }

        validate(&cfg)?;
        Ok(cfg)
    }
}
