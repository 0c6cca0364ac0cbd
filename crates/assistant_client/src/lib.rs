//! Assistant-service boundary and the chat session that ties the pipeline
//! together: one query goes out, the returned payload is interpreted into a
//! transcript reply plus a map command, and the command is handed to the map
//! controller. A failed service call yields a fixed fallback reply and
//! leaves the map state untouched.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use interpreter::interpret;
use map_view::MapController;
use reqwest::Client;
use shared::{
    error::{ApiError, ApiException},
    payload::AssistantPayload,
    protocol::{AssistantRequest, MapCommand, Sender, TranscriptEntry},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub const GREETING: &str = "Hi! I'm your map assistant. Ask me about places, get directions, or find locations. For example: 'Find restaurants near me' or 'Directions to the airport'";
pub const SERVICE_FAILURE_REPLY: &str = "Sorry, something went wrong. Please try again.";

#[async_trait]
pub trait AssistantService: Send + Sync {
    async fn ask(&self, query: &str) -> Result<AssistantPayload>;
}

pub struct MissingAssistantService;

#[async_trait]
impl AssistantService for MissingAssistantService {
    async fn ask(&self, _query: &str) -> Result<AssistantPayload> {
        Err(anyhow!("assistant service is unavailable"))
    }
}

/// HTTP client for the remote assistant service.
pub struct HttpAssistantService {
    http: Client,
    base_url: String,
}

impl HttpAssistantService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AssistantService for HttpAssistantService {
    async fn ask(&self, query: &str) -> Result<AssistantPayload> {
        let response = self
            .http
            .post(format!("{}/ai_assistant", self.base_url))
            .json(&AssistantRequest {
                query: query.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ApiError>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(ApiException { message }.into());
        }

        Ok(response.json().await?)
    }
}

#[derive(Debug, Clone)]
pub enum ChatEvent {
    EntryAppended(TranscriptEntry),
    Error(String),
}

pub struct ChatSession {
    service: Arc<dyn AssistantService>,
    map: Arc<MapController>,
    transcript: Mutex<Vec<TranscriptEntry>>,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatSession {
    pub fn new(service: Arc<dyn AssistantService>, map: Arc<MapController>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let greeting = TranscriptEntry {
            sender: Sender::Assistant,
            text: GREETING.to_string(),
            sent_at: Utc::now(),
        };
        Arc::new(Self {
            service,
            map,
            transcript: Mutex::new(vec![greeting]),
            events,
        })
    }

    /// Send one user query through the pipeline. Returns the assistant's
    /// transcript entry; only an empty query is an error.
    pub async fn send_query(self: &Arc<Self>, query: &str) -> Result<TranscriptEntry> {
        let query = query.trim();
        if query.is_empty() {
            return Err(anyhow!("query must not be empty"));
        }
        self.append(Sender::User, query.to_string()).await;

        match self.service.ask(query).await {
            Ok(payload) => {
                let interpretation = interpret(&payload);
                info!(
                    command = command_name(&interpretation.command),
                    "assistant payload interpreted"
                );
                self.map.apply_command(interpretation.command).await;
                Ok(self.append(Sender::Assistant, interpretation.reply).await)
            }
            Err(err) => {
                // External failure: fixed fallback reply, no new map command.
                warn!("assistant service call failed: {err}");
                let _ = self.events.send(ChatEvent::Error(err.to_string()));
                Ok(self
                    .append(Sender::Assistant, SERVICE_FAILURE_REPLY.to_string())
                    .await)
            }
        }
    }

    async fn append(&self, sender: Sender, text: String) -> TranscriptEntry {
        let entry = TranscriptEntry {
            sender,
            text,
            sent_at: Utc::now(),
        };
        self.transcript.lock().await.push(entry.clone());
        let _ = self.events.send(ChatEvent::EntryAppended(entry.clone()));
        entry
    }

    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.lock().await.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    pub fn map(&self) -> &Arc<MapController> {
        &self.map
    }
}

fn command_name(command: &MapCommand) -> &'static str {
    match command {
        MapCommand::None => "none",
        MapCommand::Places(_) => "places",
        MapCommand::Directions(_) => "directions",
        MapCommand::Geocode(_) => "geocode",
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
