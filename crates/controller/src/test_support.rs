use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use adc_common::{
    AlarmDefinitionSpec, DefinitionRequest, DesiredDefinition, NotificationMethod,
    RemoteDefinition,
};
use async_trait::async_trait;
use serde_json::Value;

use crate::auth::{AuthError, Credential, CredentialProvider};
use crate::desired::{DesiredError, DesiredGateway, SpecPatch};
use crate::remote::{RemoteError, RemoteGateway};

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    List,
    Create(DefinitionRequest),
    Update(String, DefinitionRequest),
    Delete(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Failure {
    NotFound,
    Conflict,
    Internal,
}

impl Failure {
    fn to_error(self) -> RemoteError {
        match self {
            Self::NotFound => RemoteError::from_status(404, "not found".into()),
            Self::Conflict => RemoteError::from_status(409, "already exists".into()),
            Self::Internal => RemoteError::from_status(500, "internal error".into()),
        }
    }
}

pub enum MethodsReply {
    Methods(Vec<NotificationMethod>),
    Fail,
}

#[derive(Default)]
pub struct FakeRemote {
    definitions: Mutex<BTreeMap<String, RemoteDefinition>>,
    calls: Mutex<Vec<RemoteCall>>,
    fail_listing: AtomicBool,
    create_failures: Mutex<VecDeque<Failure>>,
    update_failures: Mutex<VecDeque<Failure>>,
    delete_failures: Mutex<HashMap<String, Failure>>,
    methods: Mutex<VecDeque<MethodsReply>>,
    method_fetches: AtomicU32,
    next_id: AtomicU32,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, def: RemoteDefinition) {
        self.definitions
            .lock()
            .unwrap()
            .insert(def.id.clone(), def);
    }

    pub fn definition(&self, id: &str) -> Option<RemoteDefinition> {
        self.definitions.lock().unwrap().get(id).cloned()
    }

    pub fn definition_ids(&self) -> Vec<String> {
        self.definitions.lock().unwrap().keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<RemoteCall> {
        self.calls()
            .into_iter()
            .filter(|c| *c != RemoteCall::List)
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == RemoteCall::List)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn fail_next_create(&self, failure: Failure) {
        self.create_failures.lock().unwrap().push_back(failure);
    }

    pub fn fail_next_update(&self, failure: Failure) {
        self.update_failures.lock().unwrap().push_back(failure);
    }

    pub fn fail_delete(&self, id: &str, failure: Failure) {
        self.delete_failures
            .lock()
            .unwrap()
            .insert(id.to_string(), failure);
    }

    pub fn queue_methods(&self, reply: MethodsReply) {
        self.methods.lock().unwrap().push_back(reply);
    }

    pub fn method_fetches(&self) -> u32 {
        self.method_fetches.load(Ordering::SeqCst)
    }

    fn record(&self, call: RemoteCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn apply_request(def: &mut RemoteDefinition, request: &DefinitionRequest) {
    def.name = request.name.clone();
    def.description = request.description.clone();
    def.expression = request.expression.clone();
    if let Some(deterministic) = request.deterministic {
        def.deterministic = deterministic;
    }
    if let Some(ref severity) = request.severity {
        def.severity = severity.clone();
    }
    if let Some(ref match_by) = request.match_by {
        def.match_by = match_by.clone();
    }
    if let Some(ref actions) = request.alarm_actions {
        def.alarm_actions = actions.clone();
    }
    if let Some(ref actions) = request.ok_actions {
        def.ok_actions = actions.clone();
    }
    if let Some(ref actions) = request.undetermined_actions {
        def.undetermined_actions = actions.clone();
    }
}

#[async_trait]
impl RemoteGateway for FakeRemote {
    async fn list_definitions(&self) -> Result<Vec<RemoteDefinition>, RemoteError> {
        self.record(RemoteCall::List);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(Failure::Internal.to_error());
        }
        Ok(self.definitions.lock().unwrap().values().cloned().collect())
    }

    async fn create_definition(
        &self,
        request: &DefinitionRequest,
    ) -> Result<RemoteDefinition, RemoteError> {
        self.record(RemoteCall::Create(request.clone()));
        if let Some(failure) = self.create_failures.lock().unwrap().pop_front() {
            return Err(failure.to_error());
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut def = RemoteDefinition {
            id: format!("new-{n}"),
            actions_enabled: true,
            ..Default::default()
        };
        apply_request(&mut def, request);
        self.seed(def.clone());
        Ok(def)
    }

    async fn update_definition(
        &self,
        id: &str,
        request: &DefinitionRequest,
    ) -> Result<RemoteDefinition, RemoteError> {
        self.record(RemoteCall::Update(id.to_string(), request.clone()));
        if let Some(failure) = self.update_failures.lock().unwrap().pop_front() {
            return Err(failure.to_error());
        }
        let mut defs = self.definitions.lock().unwrap();
        let def = defs
            .get_mut(id)
            .ok_or_else(|| Failure::NotFound.to_error())?;
        apply_request(def, request);
        Ok(def.clone())
    }

    async fn delete_definition(&self, id: &str) -> Result<(), RemoteError> {
        self.record(RemoteCall::Delete(id.to_string()));
        if let Some(failure) = self.delete_failures.lock().unwrap().get(id) {
            return Err(failure.to_error());
        }
        match self.definitions.lock().unwrap().remove(id) {
            Some(_) => Ok(()),
            None => Err(Failure::NotFound.to_error()),
        }
    }

    async fn list_notification_methods(&self) -> Result<Vec<NotificationMethod>, RemoteError> {
        self.method_fetches.fetch_add(1, Ordering::SeqCst);
        match self.methods.lock().unwrap().pop_front() {
            Some(MethodsReply::Methods(methods)) => Ok(methods),
            Some(MethodsReply::Fail) => Err(Failure::Internal.to_error()),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Default)]
pub struct FakeDesired {
    objects: Mutex<Vec<DesiredDefinition>>,
    patches: Mutex<Vec<(String, SpecPatch)>>,
    fail_listing: AtomicBool,
    fail_patches: AtomicBool,
}

impl FakeDesired {
    pub fn new(objects: Vec<DesiredDefinition>) -> Self {
        Self {
            objects: Mutex::new(objects),
            ..Default::default()
        }
    }

    pub fn objects(&self) -> Vec<DesiredDefinition> {
        self.objects.lock().unwrap().clone()
    }

    pub fn object(&self, name: &str) -> Option<DesiredDefinition> {
        self.objects().into_iter().find(|o| o.name == name)
    }

    pub fn insert(&self, obj: DesiredDefinition) {
        self.objects.lock().unwrap().push(obj);
    }

    pub fn remove(&self, name: &str) {
        self.objects.lock().unwrap().retain(|o| o.name != name);
    }

    pub fn replace_spec(&self, name: &str, spec: AlarmDefinitionSpec) {
        if let Some(obj) = self.objects.lock().unwrap().iter_mut().find(|o| o.name == name) {
            obj.spec = spec;
        }
    }

    pub fn patches(&self) -> Vec<(String, SpecPatch)> {
        self.patches.lock().unwrap().clone()
    }

    pub fn patches_for(&self, name: &str) -> Vec<SpecPatch> {
        self.patches()
            .into_iter()
            .filter(|(n, _)| n == name)
            .map(|(_, p)| p)
            .collect()
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn fail_patches(&self, fail: bool) {
        self.fail_patches.store(fail, Ordering::SeqCst);
    }
}

fn apply_patch(spec: &mut AlarmDefinitionSpec, patch: &SpecPatch) {
    if let Some(Value::String(id)) = patch.get("id") {
        spec.id = Some(id.clone());
    }
    if let Some(Value::Array(actions)) = patch.get("alarm_actions") {
        spec.alarm_actions = actions
            .iter()
            .filter_map(|a| a.as_str().map(str::to_string))
            .collect();
    }
    match patch.get("error") {
        Some(Value::String(message)) => spec.error = Some(message.clone()),
        Some(Value::Null) => spec.error = None,
        _ => {}
    }
}

#[async_trait]
impl DesiredGateway for FakeDesired {
    async fn list(&self) -> Result<Vec<DesiredDefinition>, DesiredError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(DesiredError::Api("connection refused".into()));
        }
        Ok(self.objects())
    }

    async fn patch_spec(
        &self,
        target: &DesiredDefinition,
        patch: &SpecPatch,
    ) -> Result<(), DesiredError> {
        if self.fail_patches.load(Ordering::SeqCst) {
            return Err(DesiredError::Api("patch rejected".into()));
        }
        self.patches
            .lock()
            .unwrap()
            .push((target.name.clone(), patch.clone()));
        if let Some(obj) = self
            .objects
            .lock()
            .unwrap()
            .iter_mut()
            .find(|o| o.name == target.name && o.namespace == target.namespace)
        {
            apply_patch(&mut obj.spec, patch);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeCredentials {
    fail: AtomicBool,
    refreshes: AtomicU32,
}

impl FakeCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn refreshes(&self) -> u32 {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for FakeCredentials {
    async fn refresh(&self) -> Result<Credential, AuthError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AuthError::Rejected { status: 401 });
        }
        Ok(Credential {
            token: "fake-token".into(),
        })
    }
}

pub fn spec(name: &str) -> AlarmDefinitionSpec {
    AlarmDefinitionSpec {
        name: name.to_string(),
        expression: format!("avg({name}) > 90"),
        description: format!("{name} alarm"),
        severity: "HIGH".into(),
        ..Default::default()
    }
}

pub fn desired(name: &str, spec: AlarmDefinitionSpec) -> DesiredDefinition {
    DesiredDefinition {
        name: name.to_string(),
        namespace: "default".into(),
        spec,
    }
}

pub fn remote_def(id: &str, name: &str) -> RemoteDefinition {
    let base = name.trim_end_matches(adc_common::MANAGED_SUFFIX);
    let s = spec(base);
    RemoteDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: s.description,
        expression: s.expression,
        severity: s.severity,
        actions_enabled: true,
        ..Default::default()
    }
}

pub fn notification(id: &str, name: &str) -> NotificationMethod {
    NotificationMethod {
        id: id.to_string(),
        name: name.to_string(),
        kind: "EMAIL".into(),
        address: format!("{name}@example.com"),
        period: 0,
    }
}
