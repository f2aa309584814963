mod store;

pub use store::{desired_from_object, KubeDefinitionStore, SPEC_KEY};

use adc_common::DesiredDefinition;
use async_trait::async_trait;
use serde_json::{Map, Value};

#[async_trait]
pub trait DesiredGateway: Send + Sync {
    async fn list(&self) -> Result<Vec<DesiredDefinition>, DesiredError>;

    async fn patch_spec(
        &self,
        target: &DesiredDefinition,
        patch: &SpecPatch,
    ) -> Result<(), DesiredError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DesiredError {
    #[error("kube api: {0}")]
    Api(String),
    #[error("resource {name} has an unreadable spec: {reason}")]
    Decode { name: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecPatch {
    fields: Map<String, Value>,
}

impl SpecPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_id(mut self, id: &str) -> Self {
        self.fields.insert("id".into(), Value::from(id));
        self
    }

    pub fn set_alarm_actions(mut self, actions: &[String]) -> Self {
        self.fields.insert("alarm_actions".into(), Value::from(actions.to_vec()));
        self
    }

    pub fn set_error(mut self, message: &str) -> Self {
        self.fields.insert("error".into(), Value::from(message));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.fields.insert("error".into(), Value::Null);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}
