//! Test utilities for saga_narrative tests.
//!
//! Provides a scripted driver that answers by matching the request task.

#![allow(dead_code)]

use async_trait::async_trait;
use saga_core::{GameSettings, GenerationRequest, GenerationResponse};
use saga_error::{GenerationError, GenerationErrorKind, SagaResult};
use saga_interface::NarrativeDriver;
use saga_narrative::NarrativeService;
use saga_retry::RetryPolicy;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How the mock answers one call.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return this completion text
    Text(String),
    /// Fail with this error kind
    Fail(GenerationErrorKind),
    /// Sleep before answering with the text
    Slow(Duration, String),
}

impl MockBehavior {
    pub fn json(value: serde_json::Value) -> Self {
        MockBehavior::Text(value.to_string())
    }
}

/// Driver answering from per-task scripts.
///
/// A route whose key appears in the request task answers first; its queue is
/// consumed in order and the last entry repeats. Unrouted requests use the
/// default behavior.
#[derive(Debug)]
pub struct MockDriver {
    routes: Mutex<Vec<(String, VecDeque<MockBehavior>)>>,
    default: MockBehavior,
    calls: AtomicUsize,
}

impl MockDriver {
    /// A driver that fails every unrouted call as unavailable.
    pub fn new() -> Self {
        Self::with_default(MockBehavior::Fail(GenerationErrorKind::Unavailable(
            "mock".to_string(),
        )))
    }

    pub fn with_default(default: MockBehavior) -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            default,
            calls: AtomicUsize::new(0),
        }
    }

    /// Script the answers for requests whose task contains `task`.
    pub fn route(self, task: &str, behaviors: Vec<MockBehavior>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push((task.to_string(), behaviors.into_iter().collect()));
        self
    }

    /// Calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_behavior(&self, task: &str) -> MockBehavior {
        let mut routes = self.routes.lock().unwrap();
        for (key, queue) in routes.iter_mut() {
            if task.contains(key.as_str()) {
                return if queue.len() > 1 {
                    queue.pop_front().unwrap()
                } else {
                    queue.front().cloned().unwrap_or_else(|| self.default.clone())
                };
            }
        }
        self.default.clone()
    }
}

#[async_trait]
impl NarrativeDriver for MockDriver {
    async fn generate(&self, request: &GenerationRequest) -> SagaResult<GenerationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_behavior(&request.task) {
            MockBehavior::Text(text) => Ok(GenerationResponse::text(text)),
            MockBehavior::Fail(kind) => Err(GenerationError::new(kind).into()),
            MockBehavior::Slow(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(GenerationResponse::text(text))
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// A service over `driver` that never retries.
pub fn service(driver: Arc<MockDriver>) -> Arc<NarrativeService> {
    Arc::new(NarrativeService::new(driver).with_retry(RetryPolicy::no_retry()))
}

/// A service that is always unavailable.
pub fn offline_service() -> Arc<NarrativeService> {
    Arc::new(
        NarrativeService::new(Arc::new(saga_models::OfflineDriver))
            .with_retry(RetryPolicy::no_retry()),
    )
}

/// Small game settings for fast tests.
pub fn test_settings() -> GameSettings {
    GameSettings {
        total_turns: 10,
        turns_per_stage: 2,
        profile_reveal_turn: 2,
        ..GameSettings::default()
    }
}
