//! The per-session worker task and the host's handle to it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use quarto_yaml_validation::{ModelResult, SchemaModel, ValidatorOptions};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::completions::CompletionResult;
use crate::context::YamlIntelligenceContext;
use crate::error::DispatchError;
use crate::lint::LintDiagnostic;
use crate::protocol::{GET_COMPLETIONS, GET_LINT, Request, Response, handle_request};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkerConfig {
    /// How long the host waits for a reply
    pub request_timeout_ms: u64,
    /// Requests that may wait in the channel before `call` blocks
    pub queue_capacity: usize,
    /// "Did you mean" suggestions per lint diagnostic. Completion lists
    /// are never capped.
    pub max_suggestions: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            request_timeout_ms: 5000,
            queue_capacity: 32,
            max_suggestions: 3,
        }
    }
}

struct Envelope {
    request: Request,
    reply: oneshot::Sender<Response>,
}

pub struct Worker;

impl Worker {
    /// Start a worker that loads the process-wide schema model before
    /// serving its first request.
    ///
    /// The loader runs at most once per process. If it fails, the worker
    /// stays up and answers every request with `NotInitialized`.
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(config: WorkerConfig, loader: F) -> WorkerHandle
    where
        F: FnOnce() -> ModelResult<SchemaModel> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let options = options_for(&config);
        tokio::spawn(async move {
            let model = match tokio::task::spawn_blocking(move || SchemaModel::ensure_loaded(loader)).await {
                Ok(Ok(model)) => {
                    info!(schemas = model.registry().len(), "schema model loaded");
                    Some(model)
                }
                Ok(Err(error)) => {
                    warn!(%error, "schema model failed to load");
                    None
                }
                Err(error) => {
                    warn!(%error, "schema loader did not finish");
                    None
                }
            };
            serve(receiver, model, options).await;
        });
        WorkerHandle::new(sender, &config)
    }

    /// Start a worker over an already loaded model.
    pub fn spawn_with_model(config: WorkerConfig, model: Arc<SchemaModel>) -> WorkerHandle {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let options = options_for(&config);
        tokio::spawn(serve(receiver, Some(model), options));
        WorkerHandle::new(sender, &config)
    }
}

fn options_for(config: &WorkerConfig) -> ValidatorOptions {
    ValidatorOptions {
        max_suggestions: config.max_suggestions,
    }
}

async fn serve(
    mut receiver: mpsc::Receiver<Envelope>,
    model: Option<Arc<SchemaModel>>,
    options: ValidatorOptions,
) {
    info!("yaml intelligence worker started");
    while let Some(Envelope { request, reply }) = receiver.recv().await {
        let response = handle_request(&request, model.as_deref(), &options);
        if reply.send(response).is_err() {
            debug!(id = request.id, "host stopped waiting; reply dropped");
        }
    }
    info!("yaml intelligence worker stopped");
}

/// Host side of a worker. Cheap to clone; the worker stops once every
/// handle is dropped.
#[derive(Clone)]
pub struct WorkerHandle {
    sender: mpsc::Sender<Envelope>,
    timeout: Duration,
    next_id: Arc<AtomicU64>,
}

impl WorkerHandle {
    fn new(sender: mpsc::Sender<Envelope>, config: &WorkerConfig) -> Self {
        WorkerHandle {
            sender,
            timeout: Duration::from_millis(config.request_timeout_ms),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// The same worker with a different reply timeout.
    pub fn with_timeout(&self, timeout: Duration) -> WorkerHandle {
        WorkerHandle {
            timeout,
            ..self.clone()
        }
    }

    /// Send `request` and wait for its response.
    ///
    /// The timeout covers queueing and serving. A timed out request is not
    /// cancelled; its late reply is dropped, and the host should request
    /// again with fresh text.
    pub async fn call(&self, request: Request) -> Result<Response, DispatchError> {
        let id = request.id;
        let (reply, response) = oneshot::channel();
        let exchange = async {
            self.sender
                .send(Envelope { request, reply })
                .await
                .map_err(|_| DispatchError::Closed)?;
            response.await.map_err(|_| DispatchError::Closed)
        };
        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(id, timeout_ms, "request timed out");
                Err(DispatchError::Timeout { id, timeout_ms })
            }
        }
    }

    pub async fn get_lint(&self, ctx: &YamlIntelligenceContext) -> Result<Vec<LintDiagnostic>, DispatchError> {
        self.request(GET_LINT, ctx).await
    }

    pub async fn get_completions(&self, ctx: &YamlIntelligenceContext) -> Result<CompletionResult, DispatchError> {
        self.request(GET_COMPLETIONS, ctx).await
    }

    async fn request<T>(&self, method: &str, ctx: &YamlIntelligenceContext) -> Result<T, DispatchError>
    where
        T: serde::de::DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let value = self.call(Request::new(id, method, ctx)).await?.into_result()?;
        serde_json::from_value(value).map_err(|e| DispatchError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: WorkerConfig = serde_json::from_str(r#"{"requestTimeoutMs": 250}"#).unwrap();
        assert_eq!(
            config,
            WorkerConfig {
                request_timeout_ms: 250,
                ..WorkerConfig::default()
            }
        );
    }

    #[tokio::test]
    async fn test_closed_worker() {
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        let handle = WorkerHandle::new(sender, &WorkerConfig::default());
        let ctx = YamlIntelligenceContext::default();
        assert_eq!(handle.get_lint(&ctx).await, Err(DispatchError::Closed));
    }
}
