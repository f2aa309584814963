mod monasca;

pub use monasca::MonascaClient;

use adc_common::{DefinitionRequest, NotificationMethod, RemoteDefinition};
use async_trait::async_trait;

#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn list_definitions(&self) -> Result<Vec<RemoteDefinition>, RemoteError>;
    async fn create_definition(
        &self,
        request: &DefinitionRequest,
    ) -> Result<RemoteDefinition, RemoteError>;
    async fn update_definition(
        &self,
        id: &str,
        request: &DefinitionRequest,
    ) -> Result<RemoteDefinition, RemoteError>;
    async fn delete_definition(&self, id: &str) -> Result<(), RemoteError>;
    async fn list_notification_methods(&self) -> Result<Vec<NotificationMethod>, RemoteError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport: {0}")]
    Transport(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("no auth token installed")]
    Unauthenticated,
}

impl RemoteError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 => Self::NotFound(body),
            409 => Self::Conflict(body),
            _ => Self::Status { status, body },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
