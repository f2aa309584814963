mod keystone;

pub use keystone::{KeystoneOptions, KeystoneProvider};

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn refresh(&self) -> Result<Credential, AuthError>;
}

#[derive(Clone, PartialEq)]
pub struct Credential {
    pub token: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential").field("token", &"<redacted>").finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing auth option {0}")]
    MissingOption(&'static str),
    #[error("identity service rejected credentials with status {status}")]
    Rejected { status: u16 },
    #[error("identity response carried no X-Subject-Token header")]
    MissingToken,
    #[error("transport: {0}")]
    Transport(String),
}

#[derive(Clone, Default)]
pub struct TokenSlot {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenSlot {
    pub fn install(&self, token: String) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = Some(token);
        }
    }

    pub fn current(&self) -> Option<String> {
        self.inner.read().ok().and_then(|slot| slot.clone())
    }
}

impl std::fmt::Debug for TokenSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSlot")
            .field("installed", &self.current().is_some())
            .finish()
    }
}
