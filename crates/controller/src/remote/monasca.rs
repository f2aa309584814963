use adc_common::{DefinitionRequest, NotificationMethod, RemoteDefinition};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{RemoteError, RemoteGateway};
use crate::auth::TokenSlot;

const MAX_PAGES: usize = 1000;

pub struct MonascaClient {
    base_url: String,
    token: TokenSlot,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    elements: Vec<T>,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Deserialize)]
struct Link {
    rel: String,
    href: String,
}

impl MonascaClient {
    pub fn new(base_url: &str, token: TokenSlot, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, RemoteError> {
        let token = self.token.current().ok_or(RemoteError::Unauthenticated)?;
        Ok(self
            .http
            .request(method, url)
            .header("X-Auth-Token", token)
            .header("Accept", "application/json"))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, RemoteError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(RemoteError::from_status(status.as_u16(), body))
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, RemoteError> {
        resp.json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, RemoteError> {
        let mut url = format!("{}{path}", self.base_url);
        let mut items = Vec::new();

        for _ in 0..MAX_PAGES {
            let resp = self.send(self.request(Method::GET, &url)?).await?;
            let page: Page<T> = Self::decode(resp).await?;
            let fetched = page.elements.len();
            items.extend(page.elements);

            let next = page
                .links
                .into_iter()
                .find(|l| l.rel == "next")
                .map(|l| l.href);
            match next {
                Some(href) if fetched > 0 && href != url => url = href,
                _ => return Ok(items),
            }
        }

        tracing::warn!(path, pages = MAX_PAGES, "pagination limit reached");
        Ok(items)
    }
}

#[async_trait]
impl RemoteGateway for MonascaClient {
    async fn list_definitions(&self) -> Result<Vec<RemoteDefinition>, RemoteError> {
        self.list_all("/alarm-definitions").await
    }

    async fn create_definition(
        &self,
        request: &DefinitionRequest,
    ) -> Result<RemoteDefinition, RemoteError> {
        let url = format!("{}/alarm-definitions", self.base_url);
        let resp = self
            .send(self.request(Method::POST, &url)?.json(request))
            .await?;
        Self::decode(resp).await
    }

    async fn update_definition(
        &self,
        id: &str,
        request: &DefinitionRequest,
    ) -> Result<RemoteDefinition, RemoteError> {
        let url = format!("{}/alarm-definitions/{id}", self.base_url);
        let resp = self
            .send(self.request(Method::PATCH, &url)?.json(request))
            .await?;
        Self::decode(resp).await
    }

    async fn delete_definition(&self, id: &str) -> Result<(), RemoteError> {
        let url = format!("{}/alarm-definitions/{id}", self.base_url);
        self.send(self.request(Method::DELETE, &url)?).await?;
        Ok(())
    }

    async fn list_notification_methods(&self) -> Result<Vec<NotificationMethod>, RemoteError> {
        self.list_all("/notification-methods").await
    }
}
