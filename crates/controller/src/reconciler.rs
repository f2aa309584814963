use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use adc_common::{matches, DefinitionRequest, DesiredDefinition};

use crate::auth::{AuthError, CredentialProvider};
use crate::cache::RemoteCache;
use crate::desired::{DesiredError, DesiredGateway, SpecPatch};
use crate::metrics::ControllerMetrics;
use crate::remote::{RemoteError, RemoteGateway};
use crate::resolver::DefaultActionBinding;

#[derive(Debug, thiserror::Error)]
pub enum IterationError {
    #[error("credential refresh failed: {0}")]
    Auth(#[from] AuthError),
    #[error("fetching alarm definition resources failed: {0}")]
    Fetch(#[from] DesiredError),
    #[error("listing remote alarm definitions failed: {0}")]
    RemoteFetch(#[from] RemoteError),
}

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("recording result on resource failed: {0}")]
    WriteBack(#[from] DesiredError),
}

impl ApplyError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_conflict())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct IterationReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub cache_refreshes: usize,
}

impl IterationReport {
    pub fn remote_changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

pub struct Reconciler {
    desired: Arc<dyn DesiredGateway>,
    remote: Arc<dyn RemoteGateway>,
    credentials: Arc<dyn CredentialProvider>,
    cache: RemoteCache,
    default_action: Option<DefaultActionBinding>,
    metrics: Arc<ControllerMetrics>,
    poll_interval: Duration,
}

impl Reconciler {
    pub fn new(
        desired: Arc<dyn DesiredGateway>,
        remote: Arc<dyn RemoteGateway>,
        credentials: Arc<dyn CredentialProvider>,
        metrics: Arc<ControllerMetrics>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            desired,
            remote,
            credentials,
            cache: RemoteCache::new(),
            default_action: None,
            metrics,
            poll_interval,
        }
    }

    pub fn with_default_action(mut self, binding: DefaultActionBinding) -> Self {
        self.default_action = Some(binding);
        self
    }

    pub fn cache(&self) -> &RemoteCache {
        &self.cache
    }

    pub async fn prime(&mut self) -> Result<usize, IterationError> {
        self.credentials.refresh().await?;
        let count = self.refresh_cache().await?;
        self.metrics.mark_primed();
        tracing::info!(cached = count, ids = ?self.cache.ids(), "found existing alarm definitions");
        Ok(count)
    }

    // No sleep before the first pass.
    pub async fn run(mut self) {
        let mut first = true;
        loop {
            if !first {
                tokio::time::sleep(self.poll_interval).await;
            }
            first = false;

            match self.run_iteration().await {
                Ok(report) if report.remote_changes() > 0 || report.failed > 0 => {
                    tracing::info!(
                        created = report.created,
                        updated = report.updated,
                        deleted = report.deleted,
                        unchanged = report.unchanged,
                        failed = report.failed,
                        "reconciliation pass finished"
                    );
                }
                Ok(report) => {
                    tracing::debug!(unchanged = report.unchanged, "nothing to reconcile");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping reconciliation pass");
                }
            }
        }
    }

    pub async fn run_iteration(&mut self) -> Result<IterationReport, IterationError> {
        let start = Instant::now();
        let result = self.iterate().await;
        match result {
            Ok(_) => {
                self.metrics.inc_iterations();
                self.metrics.record_iteration_latency(start);
            }
            Err(_) => self.metrics.inc_iterations_skipped(),
        }
        self.metrics.set_cached_definitions(self.cache.len());
        result
    }

    async fn iterate(&mut self) -> Result<IterationReport, IterationError> {
        self.credentials.refresh().await?;
        let items = self.desired.list().await?;

        let mut report = IterationReport::default();
        self.delete_pass(&items, &mut report).await;

        for item in &items {
            match item.remote_id() {
                None => self.create(item, &mut report).await,
                Some(id) => {
                    let id = id.to_string();
                    self.update_if_changed(&id, item, &mut report).await;
                }
            }
        }

        Ok(report)
    }

    async fn delete_pass(&mut self, items: &[DesiredDefinition], report: &mut IterationReport) {
        let wanted: HashSet<&str> = items.iter().filter_map(|i| i.remote_id()).collect();
        let orphans: Vec<String> = self
            .cache
            .ids()
            .into_iter()
            .filter(|id| !wanted.contains(id.as_str()))
            .collect();

        for id in orphans {
            match self.remote.delete_definition(&id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    tracing::debug!(id = %id, "definition already gone");
                }
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "removing definition failed");
                    self.metrics.inc_definition_errors();
                    report.failed += 1;
                    continue;
                }
            }
            let removed = self.cache.remove(&id);
            tracing::info!(
                id = %id,
                name = removed.as_ref().map(|d| d.name.as_str()).unwrap_or(""),
                "removed definition"
            );
            self.metrics.inc_definitions_deleted();
            report.deleted += 1;
        }
    }

    async fn create(&mut self, item: &DesiredDefinition, report: &mut IterationReport) {
        let (request, injected) = self.creation_request(item);
        let created = match self.remote.create_definition(&request).await {
            Ok(created) => created,
            Err(e) => {
                let e = ApplyError::from(e);
                if e.is_conflict() {
                    tracing::warn!(
                        resource = %item.key(),
                        "mismatch between definitions and cache, updating cache"
                    );
                    report.cache_refreshes += 1;
                    if let Err(refresh_err) = self.refresh_cache().await {
                        tracing::warn!(error = %refresh_err, "cache refresh failed");
                    }
                }
                tracing::warn!(resource = %item.key(), error = %e, "adding definition failed");
                self.fail(item, &e, report).await;
                return;
            }
        };

        self.cache.put(created.id.clone(), created.clone());
        tracing::info!(resource = %item.key(), id = %created.id, "added definition");
        self.metrics.inc_definitions_created();
        report.created += 1;

        let mut patch = SpecPatch::new().set_id(&created.id);
        if let Some(ref actions) = injected {
            patch = patch.set_alarm_actions(actions);
        }
        if item.spec.error.is_some() {
            patch = patch.clear_error();
        }
        if let Err(e) = self.desired.patch_spec(item, &patch).await {
            let e = ApplyError::from(e);
            tracing::warn!(resource = %item.key(), id = %created.id, error = %e, "recording new id failed");
            self.fail(item, &e, report).await;
        }
    }

    // Also yields the injected default action list, which must be written back.
    fn creation_request(&self, item: &DesiredDefinition) -> (DefinitionRequest, Option<Vec<String>>) {
        let mut spec = item.spec.clone();
        let mut injected = None;
        if let Some(ref binding) = self.default_action {
            if spec.alarm_actions.is_empty() {
                match binding.resolved_id() {
                    Some(id) => {
                        spec.alarm_actions = vec![id.to_string()];
                        injected = Some(spec.alarm_actions.clone());
                    }
                    None => tracing::debug!(
                        resource = %item.key(),
                        name = binding.name(),
                        "default notification not resolved yet, creating without it"
                    ),
                }
            }
        }
        (DefinitionRequest::for_create(&spec), injected)
    }

    async fn update_if_changed(
        &mut self,
        id: &str,
        item: &DesiredDefinition,
        report: &mut IterationReport,
    ) {
        let Some(cached) = self.cache.get(id) else {
            tracing::debug!(resource = %item.key(), id, "no cached definition for id");
            return;
        };
        if matches(&item.spec, cached) {
            report.unchanged += 1;
            self.clear_recorded_error(item).await;
            return;
        }

        let request = DefinitionRequest::for_update(&item.spec);
        match self.remote.update_definition(id, &request).await {
            Ok(updated) => {
                self.cache.put(id.to_string(), updated);
                tracing::info!(resource = %item.key(), id, "updated definition");
                self.metrics.inc_definitions_updated();
                report.updated += 1;
                self.clear_recorded_error(item).await;
            }
            Err(e) => {
                let e = ApplyError::from(e);
                tracing::warn!(resource = %item.key(), id, error = %e, "updating definition failed");
                self.fail(item, &e, report).await;
            }
        }
    }

    // A failed clear is retried by the next pass that finds the object in sync.
    async fn clear_recorded_error(&self, item: &DesiredDefinition) {
        if item.spec.error.is_none() {
            return;
        }
        match self.desired.patch_spec(item, &SpecPatch::new().clear_error()).await {
            Ok(()) => tracing::info!(resource = %item.key(), "cleared recorded error"),
            Err(e) => {
                tracing::warn!(resource = %item.key(), error = %e, "clearing recorded error failed");
                self.metrics.inc_definition_errors();
            }
        }
    }

    async fn fail(&self, item: &DesiredDefinition, err: &ApplyError, report: &mut IterationReport) {
        self.metrics.inc_definition_errors();
        report.failed += 1;
        self.record_error(item, err).await;
    }

    async fn record_error(&self, item: &DesiredDefinition, err: &ApplyError) {
        let message = err.to_string();
        // identical message already recorded
        if item.spec.error.as_deref() == Some(message.as_str()) {
            return;
        }
        let patch = SpecPatch::new().set_error(&message);
        match self.desired.patch_spec(item, &patch).await {
            Ok(()) => tracing::info!(resource = %item.key(), "applied error to alarm definition"),
            Err(e) => tracing::warn!(resource = %item.key(), error = %e, "recording error failed"),
        }
    }

    async fn refresh_cache(&mut self) -> Result<usize, RemoteError> {
        let count = self.cache.refresh(self.remote.as_ref()).await?;
        self.metrics.inc_cache_refreshes();
        self.metrics.set_cached_definitions(count);
        Ok(count)
    }
}
