use serde::{Deserialize, Serialize};

use crate::naming::managed_name;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlarmDefinitionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub deterministic: bool,
    #[serde(default)]
    pub match_by: Vec<String>,
    #[serde(default)]
    pub alarm_actions: Vec<String>,
    #[serde(default)]
    pub ok_actions: Vec<String>,
    #[serde(default)]
    pub undetermined_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AlarmDefinitionSpec {
    /// The assigned Monasca id; an empty string counts as unassigned.
    pub fn remote_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesiredDefinition {
    pub name: String,
    pub namespace: String,
    pub spec: AlarmDefinitionSpec,
}

impl DesiredDefinition {
    pub fn remote_id(&self) -> Option<&str> {
        self.spec.remote_id()
    }

    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RemoteDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub deterministic: bool,
    #[serde(default)]
    pub match_by: Vec<String>,
    #[serde(default)]
    pub severity: String,
    #[serde(default = "enabled")]
    pub actions_enabled: bool,
    #[serde(default)]
    pub alarm_actions: Vec<String>,
    #[serde(default)]
    pub ok_actions: Vec<String>,
    #[serde(default)]
    pub undetermined_actions: Vec<String>,
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DefinitionRequest {
    pub name: String,
    pub description: String,
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deterministic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_by: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_actions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok_actions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undetermined_actions: Option<Vec<String>>,
}

impl DefinitionRequest {
    pub fn for_create(spec: &AlarmDefinitionSpec) -> Self {
        Self {
            name: managed_name(&spec.name),
            description: spec.description.clone(),
            expression: spec.expression.clone(),
            deterministic: spec.deterministic.then_some(true),
            severity: non_empty_str(&spec.severity),
            match_by: non_empty(&spec.match_by),
            alarm_actions: non_empty(&spec.alarm_actions),
            ok_actions: non_empty(&spec.ok_actions),
            undetermined_actions: non_empty(&spec.undetermined_actions),
        }
    }

    pub fn for_update(spec: &AlarmDefinitionSpec) -> Self {
        Self {
            name: managed_name(&spec.name),
            description: spec.description.clone(),
            expression: spec.expression.clone(),
            deterministic: Some(spec.deterministic),
            severity: non_empty_str(&spec.severity),
            match_by: non_empty(&spec.match_by),
            alarm_actions: Some(spec.alarm_actions.clone()),
            ok_actions: Some(spec.ok_actions.clone()),
            undetermined_actions: Some(spec.undetermined_actions.clone()),
        }
    }
}

fn non_empty(list: &[String]) -> Option<Vec<String>> {
    if list.is_empty() {
        None
    } else {
        Some(list.to_vec())
    }
}

fn non_empty_str(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

pub fn lists_match(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().all(|item| b.contains(item))
}

pub fn matches(spec: &AlarmDefinitionSpec, remote: &RemoteDefinition) -> bool {
    managed_name(&spec.name) == remote.name
        && spec.description == remote.description
        && spec.expression == remote.expression
        && spec.deterministic == remote.deterministic
        && spec.severity == remote.severity
        && lists_match(&spec.alarm_actions, &remote.alarm_actions)
        && lists_match(&spec.ok_actions, &remote.ok_actions)
        && lists_match(&spec.undetermined_actions, &remote.undetermined_actions)
}
