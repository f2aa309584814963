use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinHandle;

use crate::api;
use crate::auth::{KeystoneOptions, KeystoneProvider, TokenSlot};
use crate::config::ControllerConfig;
use crate::desired::KubeDefinitionStore;
use crate::metrics::ControllerMetrics;
use crate::reconciler::Reconciler;
use crate::remote::{MonascaClient, RemoteGateway};
use crate::resolver::{DefaultActionBinding, DefaultActionResolver, ResolveError};

pub async fn run(config: ControllerConfig) -> anyhow::Result<()> {
    tracing::info!(
        namespace = %config.namespace,
        monasca = %config.monasca_url,
        interval_s = config.poll_interval_seconds,
        "controller configured"
    );

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("building HTTP client")?;

    let token = TokenSlot::default();
    let remote: Arc<dyn RemoteGateway> = Arc::new(MonascaClient::new(
        &config.monasca_url,
        token.clone(),
        http.clone(),
    ));
    let options = KeystoneOptions::from_env().context("reading keystone settings")?;
    let credentials = Arc::new(KeystoneProvider::new(options, token, http));

    let kube_client = kube::Client::try_default()
        .await
        .context("building kubernetes client")?;
    let desired = Arc::new(KubeDefinitionStore::new(
        kube_client,
        &config.namespace,
        &config.resource_version,
    ));

    let metrics_addr = config
        .metrics_socket_addr()
        .with_context(|| format!("invalid metrics address {:?}", config.metrics_addr))?;
    let listener = api::bind(metrics_addr)
        .await
        .with_context(|| format!("binding metrics endpoint {metrics_addr}"))?;
    let metrics = ControllerMetrics::new();
    let api_task = tokio::spawn(api::serve(listener, metrics.clone()));

    let interval = config.poll_interval();
    let binding = config
        .default_notification
        .clone()
        .map(DefaultActionBinding::new);

    let mut reconciler = Reconciler::new(desired, remote.clone(), credentials, metrics, interval);
    if let Some(ref binding) = binding {
        reconciler = reconciler.with_default_action(binding.clone());
    }
    reconciler
        .prime()
        .await
        .context("unable to update cache from monasca")?;

    let resolver = match binding {
        Some(binding) => Some(DefaultActionResolver::new(remote, binding, interval).spawn()),
        None => {
            tracing::info!("no default notification specified, skipping lookup");
            None
        }
    };

    tracing::info!("watching for definition objects");
    tokio::select! {
        _ = reconciler.run() => Ok(()),
        fatal = watch_resolver(resolver) => Err(fatal),
        fatal = watch_api(api_task) => Err(fatal),
        _ = crate::shutdown::wait_for_shutdown() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}

// Completes only if the default notification lookup gave up.
async fn watch_resolver(handle: Option<JoinHandle<Result<String, ResolveError>>>) -> anyhow::Error {
    if let Some(handle) = handle {
        match handle.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                tracing::error!(error = %e, "could not resolve default notification, quitting");
                return anyhow::Error::new(e);
            }
            Err(e) => return anyhow::anyhow!("default notification lookup task failed: {e}"),
        }
    }
    std::future::pending().await
}

async fn watch_api(handle: JoinHandle<std::io::Result<()>>) -> anyhow::Error {
    let err = match handle.await {
        Ok(Ok(())) => anyhow::anyhow!("metrics endpoint stopped"),
        Ok(Err(e)) => anyhow::Error::new(e).context("metrics endpoint failed"),
        Err(e) => anyhow::anyhow!("metrics endpoint task failed: {e}"),
    };
    tracing::error!(error = %err, "metrics endpoint is gone, quitting");
    err
}
