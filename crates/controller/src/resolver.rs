use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::remote::{RemoteError, RemoteGateway};

/// Consecutive fetch failures after which the lookup gives up for good.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

#[derive(Debug, Clone)]
pub struct DefaultActionBinding {
    name: String,
    resolved: Arc<OnceLock<String>>,
}

impl DefaultActionBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolved: Arc::new(OnceLock::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolved_id(&self) -> Option<&str> {
        self.resolved.get().map(String::as_str)
    }

    pub fn publish(&self, id: String) -> bool {
        self.resolved.set(id).is_ok()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("could not retrieve notification methods after {attempts} tries: {last}")]
    Exhausted { attempts: u32, last: RemoteError },
}

pub struct DefaultActionResolver {
    remote: Arc<dyn RemoteGateway>,
    binding: DefaultActionBinding,
    interval: Duration,
}

impl DefaultActionResolver {
    pub fn new(
        remote: Arc<dyn RemoteGateway>,
        binding: DefaultActionBinding,
        interval: Duration,
    ) -> Self {
        Self {
            remote,
            binding,
            interval,
        }
    }

    pub async fn run(self) -> Result<String, ResolveError> {
        let name = self.binding.name().to_string();
        tracing::info!(name = %name, "searching for default notification method");

        let mut failures = 0u32;
        loop {
            match self.remote.list_notification_methods().await {
                Ok(methods) => {
                    if let Some(found) = methods.into_iter().find(|m| m.name == name) {
                        tracing::info!(name = %name, id = %found.id, "found default notification method");
                        self.binding.publish(found.id.clone());
                        return Ok(found.id);
                    }
                    tracing::info!(name = %name, "no notification method with that name yet");
                    failures = 0;
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(error = %e, failures, "fetching notification methods failed");
                    if failures >= MAX_CONSECUTIVE_FAILURES {
                        return Err(ResolveError::Exhausted {
                            attempts: failures,
                            last: e,
                        });
                    }
                }
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    pub fn spawn(self) -> JoinHandle<Result<String, ResolveError>> {
        tokio::spawn(self.run())
    }
}
