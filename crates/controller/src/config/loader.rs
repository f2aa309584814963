use std::path::Path;

use super::schema::ControllerConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("validation: {0}")]
    Validation(String),
}

pub fn load_from_file(path: &Path) -> Result<ControllerConfig, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(yaml: &str) -> Result<ControllerConfig, LoadError> {
    if yaml.trim().is_empty() {
        return Ok(ControllerConfig::default());
    }
    let cfg: ControllerConfig = serde_yaml::from_str(yaml)?;
    validate(&cfg)?;
    Ok(cfg)
}

pub fn validate(cfg: &ControllerConfig) -> Result<(), LoadError> {
    if cfg.poll_interval_seconds == 0 {
        return Err(LoadError::Validation(
            "poll_interval_seconds must be > 0".into(),
        ));
    }
    if cfg.namespace.is_empty() {
        return Err(LoadError::Validation("namespace must not be empty".into()));
    }
    if cfg.monasca_url.is_empty() {
        return Err(LoadError::Validation("monasca_url must not be empty".into()));
    }
    if cfg.resource_version.is_empty() {
        return Err(LoadError::Validation(
            "resource_version must not be empty".into(),
        ));
    }
    if cfg.metrics_socket_addr().is_none() {
        return Err(LoadError::Validation(format!(
            "metrics_addr {:?} is neither an IP address nor a socket address",
            cfg.metrics_addr
        )));
    }
    Ok(())
}
