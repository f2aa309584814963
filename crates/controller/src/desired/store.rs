use adc_common::{AlarmDefinitionSpec, DesiredDefinition};
use async_trait::async_trait;
use kube::api::{
    Api, ApiResource, DynamicObject, GroupVersionKind, ListParams, Patch, PatchParams,
};
use kube::Client;
use serde_json::{Map, Value};

use super::{DesiredError, DesiredGateway, SpecPatch};

pub const GROUP: &str = "monasca.io";
pub const KIND: &str = "AlarmDefinition";
pub const PLURAL: &str = "alarmdefinitions";
/// Key under which the resource keeps its spec.
pub const SPEC_KEY: &str = "alarmDefinitionSpec";

pub struct KubeDefinitionStore {
    client: Client,
    namespace: String,
    resource: ApiResource,
}

impl KubeDefinitionStore {
    pub fn new(client: Client, namespace: &str, version: &str) -> Self {
        let gvk = GroupVersionKind::gvk(GROUP, version, KIND);
        Self {
            client,
            namespace: namespace.to_string(),
            resource: ApiResource::from_gvk_with_plural(&gvk, PLURAL),
        }
    }

    fn api(&self, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, &self.resource)
    }
}

pub fn desired_from_object(
    obj: DynamicObject,
    default_namespace: &str,
) -> Result<DesiredDefinition, DesiredError> {
    let name = obj.metadata.name.unwrap_or_default();
    let namespace = obj
        .metadata
        .namespace
        .unwrap_or_else(|| default_namespace.to_string());

    let spec = match obj.data.get(SPEC_KEY) {
        Some(raw) => serde_json::from_value::<AlarmDefinitionSpec>(raw.clone()).map_err(|e| {
            DesiredError::Decode {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?,
        None => {
            return Err(DesiredError::Decode {
                name,
                reason: format!("missing {SPEC_KEY}"),
            })
        }
    };

    Ok(DesiredDefinition {
        name,
        namespace,
        spec,
    })
}

#[async_trait]
impl DesiredGateway for KubeDefinitionStore {
    async fn list(&self) -> Result<Vec<DesiredDefinition>, DesiredError> {
        let list = self
            .api(&self.namespace)
            .list(&ListParams::default())
            .await
            .map_err(|e| DesiredError::Api(e.to_string()))?;

        list.items
            .into_iter()
            .map(|obj| desired_from_object(obj, &self.namespace))
            .collect()
    }

    async fn patch_spec(
        &self,
        target: &DesiredDefinition,
        patch: &SpecPatch,
    ) -> Result<(), DesiredError> {
        let mut body = Map::new();
        body.insert(SPEC_KEY.to_string(), patch.to_value());
        let body = Value::Object(body);
        self.api(&target.namespace)
            .patch(&target.name, &PatchParams::default(), &Patch::Merge(&body))
            .await
            .map_err(|e| DesiredError::Api(e.to_string()))?;
        tracing::debug!(resource = %target.key(), "patched definition spec");
        Ok(())
    }
}
