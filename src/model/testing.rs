use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::model::upstream::{AttemptOutcome, Upstream};
use crate::model::{ChatMessage, Completion};

#[derive(Debug, Clone)]
pub enum Step {
    Succeed(String),
    Fail(String),
    Unauthorized,
    /// Never answers within any reasonable timeout.
    Stall,
}

/// In-process upstream that answers per model from a fixed script and
/// records every model it was asked for.
#[derive(Default)]
pub struct ScriptedUpstream {
    steps: HashMap<String, Step>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, model: &str, step: Step) -> Self {
        self.steps.insert(model.to_string(), step);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    async fn complete(&self, model: &str, _messages: &[ChatMessage]) -> AttemptOutcome {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(model.to_string());
        }

        match self.steps.get(model).cloned() {
            Some(Step::Succeed(content)) => AttemptOutcome::Success(Completion {
                content,
                model: model.to_string(),
            }),
            Some(Step::Fail(reason)) => AttemptOutcome::Failure(reason),
            Some(Step::Unauthorized) => AttemptOutcome::Unauthorized,
            Some(Step::Stall) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                AttemptOutcome::Failure(format!("{} woke up", model))
            }
            None => AttemptOutcome::Failure(format!("{} is not scripted", model)),
        }
    }
}
