//! Test doubles shared by the conversation tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use travel_assistant_ai::{CapabilityManifestEntry, ChatMessage, ChatRole, Completion, LlmError, LlmGateway};
use travel_assistant_travel::{
    DataSourceError, FlightRecord, HotelRecord, RestaurantRecord, TravelDataSource, WeatherRecord,
};

/// Builds a scripted capability intent.
pub fn intent(name: &str, arguments_json: &str) -> Result<Completion, LlmError> {
    Ok(Completion::CapabilityIntent {
        name: name.to_string(),
        arguments_json: arguments_json.to_string(),
    })
}

/// Builds a scripted text answer.
pub fn answer(text: &str) -> Result<Completion, LlmError> {
    Ok(Completion::TextAnswer(text.to_string()))
}

/// A gateway call as observed by a test double.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub with_manifest: bool,
    pub manifest_names: Vec<String>,
}

/// Gateway that replays a fixed sequence of replies.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<Completion, LlmError>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    decision_calls: AtomicUsize,
    reconcile_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(replies: impl IntoIterator<Item = Result<Completion, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls").len()
    }

    /// Calls made with a manifest.
    pub fn decision_calls(&self) -> usize {
        self.decision_calls.load(Ordering::SeqCst)
    }

    /// Calls made without a manifest.
    pub fn reconcile_calls(&self) -> usize {
        self.reconcile_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        manifest: Option<&[CapabilityManifestEntry]>,
    ) -> Result<Completion, LlmError> {
        if manifest.is_some() {
            self.decision_calls.fetch_add(1, Ordering::SeqCst);
        } else {
            self.reconcile_calls.fetch_add(1, Ordering::SeqCst);
        }
        self.calls.lock().expect("calls").push(RecordedCall {
            messages: messages.to_vec(),
            with_manifest: manifest.is_some(),
            manifest_names: manifest
                .unwrap_or_default()
                .iter()
                .map(|entry| entry.name.clone())
                .collect(),
        });

        self.replies
            .lock()
            .expect("replies")
            .pop_front()
            .unwrap_or_else(|| {
                Err(LlmError::RequestFailed {
                    reason: "no scripted reply left".to_string(),
                })
            })
    }
}

/// Gateway that answers every message by echoing the latest user message.
#[derive(Debug, Default)]
pub struct EchoGateway;

impl EchoGateway {
    pub fn reply_to(message: &str) -> String {
        format!("echo: {message}")
    }
}

#[async_trait]
impl LlmGateway for EchoGateway {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _manifest: Option<&[CapabilityManifestEntry]>,
    ) -> Result<Completion, LlmError> {
        tokio::task::yield_now().await;
        let last = messages
            .iter()
            .rev()
            .find(|message| message.role == ChatRole::User)
            .map(|message| message.content.as_str())
            .unwrap_or_default();
        Ok(Completion::TextAnswer(Self::reply_to(last)))
    }
}

/// Data source whose every read fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingTravelData;

impl FailingTravelData {
    fn unreachable() -> DataSourceError {
        DataSourceError::Unreachable {
            source: "test".to_string(),
            reason: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl TravelDataSource for FailingTravelData {
    async fn flights(&self) -> Result<Vec<FlightRecord>, DataSourceError> {
        Err(Self::unreachable())
    }

    async fn hotels(&self) -> Result<Vec<HotelRecord>, DataSourceError> {
        Err(Self::unreachable())
    }

    async fn restaurants(&self) -> Result<Vec<RestaurantRecord>, DataSourceError> {
        Err(Self::unreachable())
    }

    async fn forecasts(&self) -> Result<Vec<WeatherRecord>, DataSourceError> {
        Err(Self::unreachable())
    }
}
