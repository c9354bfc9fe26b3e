use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::time::timeout;

use crate::error::ProxyError;
use crate::model::registry::{Branch, ModelRegistry};
use crate::model::upstream::{AttemptOutcome, Upstream};
use crate::model::{ChatMessage, Completion};

pub const ATTEMPT_TIMEOUT: Duration = Duration::from_millis(8000);

/// Tries candidate models one after another until one answers.
pub struct FallbackChain {
    upstream: Arc<dyn Upstream>,
    registry: ModelRegistry,
    attempt_timeout: Duration,
}

impl FallbackChain {
    pub fn new(upstream: Arc<dyn Upstream>, registry: ModelRegistry) -> Self {
        Self {
            upstream,
            registry,
            attempt_timeout: ATTEMPT_TIMEOUT,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Each candidate is attempted at most once, in order. The first success
    /// wins and an auth rejection ends the run immediately.
    pub async fn run(
        &self,
        messages: &[ChatMessage],
        requested: Option<&str>,
    ) -> Result<Completion, ProxyError> {
        let selection = self.registry.select(messages, requested);
        let vision = selection.branch == Branch::Vision;
        info!(
            "Routing {} message(s) to {} candidate(s) ({})",
            messages.len(),
            selection.models.len(),
            if vision { "vision" } else { "text" }
        );

        let mut last_failure: Option<String> = None;

        for (attempt, model) in selection.models.iter().enumerate() {
            let attempt_future = self.upstream.complete(model, messages);
            let outcome = match timeout(self.attempt_timeout, attempt_future).await {
                Ok(outcome) => outcome,
                Err(_) => AttemptOutcome::Failure(format!(
                    "model {} timed out after {} ms",
                    model,
                    self.attempt_timeout.as_millis()
                )),
            };

            match outcome {
                AttemptOutcome::Success(completion) => {
                    if attempt > 0 {
                        info!("Fell back to model {} after {} failure(s)", model, attempt);
                    } else {
                        info!("Model {} answered", model);
                    }
                    return Ok(completion);
                }
                AttemptOutcome::Unauthorized => {
                    error!("Upstream rejected the API key while trying {}", model);
                    return Err(ProxyError::UpstreamAuth);
                }
                AttemptOutcome::Failure(reason) => {
                    warn!("Model {} failed: {}. Trying next candidate", model, reason);
                    last_failure = Some(reason);
                }
            }
        }

        warn!(
            "All {} candidate(s) exhausted; last failure: {}",
            selection.models.len(),
            last_failure.as_deref().unwrap_or("none")
        );
        Err(ProxyError::AllModelsExhausted { vision })
    }
}
