use async_trait::async_trait;
use serde_json::{json, Value};

use super::{AuthError, Credential, CredentialProvider, TokenSlot};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeystoneOptions {
    pub auth_url: String,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub password: String,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub domain_id: Option<String>,
    pub domain_name: Option<String>,
}

impl KeystoneOptions {
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let auth_url = get("OS_AUTH_URL").ok_or(AuthError::MissingOption("OS_AUTH_URL"))?;
        let user_id = get("OS_USERID");
        let username = get("OS_USERNAME");
        if user_id.is_none() && username.is_none() {
            return Err(AuthError::MissingOption("OS_USERNAME"));
        }
        let password = get("OS_PASSWORD").ok_or(AuthError::MissingOption("OS_PASSWORD"))?;

        Ok(Self {
            auth_url,
            user_id,
            username,
            password,
            project_id: get("OS_PROJECT_ID").or_else(|| get("OS_TENANT_ID")),
            project_name: get("OS_PROJECT_NAME").or_else(|| get("OS_TENANT_NAME")),
            domain_id: get("OS_DOMAIN_ID"),
            domain_name: get("OS_DOMAIN_NAME"),
        })
    }

    pub fn tokens_url(&self) -> String {
        let base = self.auth_url.trim_end_matches('/');
        if base.ends_with("/v3") {
            format!("{base}/auth/tokens")
        } else {
            format!("{base}/v3/auth/tokens")
        }
    }

    fn domain(&self) -> Option<Value> {
        match (&self.domain_id, &self.domain_name) {
            (Some(id), _) => Some(json!({ "id": id })),
            (None, Some(name)) => Some(json!({ "name": name })),
            (None, None) => None,
        }
    }

    pub fn auth_body(&self) -> Value {
        let mut user = json!({ "password": self.password });
        if let Some(ref id) = self.user_id {
            user["id"] = json!(id);
        } else if let Some(ref name) = self.username {
            user["name"] = json!(name);
            if let Some(domain) = self.domain() {
                user["domain"] = domain;
            }
        }

        let mut auth = json!({
            "identity": {
                "methods": ["password"],
                "password": { "user": user },
            }
        });

        if let Some(ref id) = self.project_id {
            auth["scope"] = json!({ "project": { "id": id } });
        } else if let Some(ref name) = self.project_name {
            let mut project = json!({ "name": name });
            if let Some(domain) = self.domain() {
                project["domain"] = domain;
            }
            auth["scope"] = json!({ "project": project });
        }

        json!({ "auth": auth })
    }
}

pub struct KeystoneProvider {
    options: KeystoneOptions,
    slot: TokenSlot,
    http: reqwest::Client,
}

impl KeystoneProvider {
    pub fn new(options: KeystoneOptions, slot: TokenSlot, http: reqwest::Client) -> Self {
        Self {
            options,
            slot,
            http,
        }
    }
}

#[async_trait]
impl CredentialProvider for KeystoneProvider {
    async fn refresh(&self) -> Result<Credential, AuthError> {
        let resp = self
            .http
            .post(self.options.tokens_url())
            .json(&self.options.auth_body())
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }

        let token = resp
            .headers()
            .get("X-Subject-Token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(AuthError::MissingToken)?;

        self.slot.install(token.clone());
        tracing::debug!(url = %self.options.auth_url, "keystone token refreshed");
        Ok(Credential { token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_required_options() {
        let opts = KeystoneOptions::from_lookup(lookup(&[
            ("OS_AUTH_URL", "http://keystone:5000/v3"),
            ("OS_USERNAME", "monasca-agent"),
            ("OS_PASSWORD", "pw"),
            ("OS_TENANT_NAME", "mini-mon"),
            ("OS_DOMAIN_NAME", "Default"),
        ]))
        .unwrap();

        assert_eq!(opts.username.as_deref(), Some("monasca-agent"));
        assert_eq!(opts.project_name.as_deref(), Some("mini-mon"));
        assert_eq!(opts.tokens_url(), "http://keystone:5000/v3/auth/tokens");
    }

    #[test]
    fn project_vars_win_over_tenant_vars() {
        let opts = KeystoneOptions::from_lookup(lookup(&[
            ("OS_AUTH_URL", "http://keystone:5000"),
            ("OS_USERID", "u-1"),
            ("OS_PASSWORD", "pw"),
            ("OS_TENANT_ID", "tenant"),
            ("OS_PROJECT_ID", "project"),
        ]))
        .unwrap();

        assert_eq!(opts.project_id.as_deref(), Some("project"));
        assert_eq!(opts.tokens_url(), "http://keystone:5000/v3/auth/tokens");
    }

    #[test]
    fn missing_values_rejected() {
        let err = KeystoneOptions::from_lookup(lookup(&[("OS_USERNAME", "u")])).unwrap_err();
        assert!(matches!(err, AuthError::MissingOption("OS_AUTH_URL")));

        let err = KeystoneOptions::from_lookup(lookup(&[
            ("OS_AUTH_URL", "http://k"),
            ("OS_PASSWORD", "pw"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AuthError::MissingOption("OS_USERNAME")));

        let err = KeystoneOptions::from_lookup(lookup(&[
            ("OS_AUTH_URL", "http://k"),
            ("OS_USERNAME", "u"),
            ("OS_PASSWORD", ""),
        ]))
        .unwrap_err();
        assert!(matches!(err, AuthError::MissingOption("OS_PASSWORD")));
    }

    #[test]
    fn auth_body_scopes_to_project() {
        let opts = KeystoneOptions {
            auth_url: "http://k/v3".into(),
            username: Some("admin".into()),
            password: "pw".into(),
            project_name: Some("monitoring".into()),
            domain_name: Some("Default".into()),
            ..Default::default()
        };
        let body = opts.auth_body();

        assert_eq!(body["auth"]["identity"]["methods"], json!(["password"]));
        assert_eq!(body["auth"]["identity"]["password"]["user"]["name"], "admin");
        assert_eq!(
            body["auth"]["identity"]["password"]["user"]["domain"]["name"],
            "Default"
        );
        assert_eq!(body["auth"]["scope"]["project"]["name"], "monitoring");
    }

    #[test]
    fn unscoped_without_project() {
        let opts = KeystoneOptions {
            auth_url: "http://k/v3".into(),
            user_id: Some("u-1".into()),
            password: "pw".into(),
            ..Default::default()
        };
        let body = opts.auth_body();
        assert!(body["auth"].get("scope").is_none());
        assert_eq!(body["auth"]["identity"]["password"]["user"]["id"], "u-1");
    }
}
