use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::payload::{GeocodeResult, Place, RouteInfo};

/// Normalized instruction describing what the map should currently display.
/// Exactly one command is active at a time; applying a new one replaces the
/// previous one atomically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MapCommand {
    None,
    Places(Vec<Place>),
    Directions(RouteInfo),
    Geocode(Vec<GeocodeResult>),
}

impl MapCommand {
    pub fn is_none(&self) -> bool {
        matches!(self, MapCommand::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

/// One transcript line. The transcript is append-only; prior entries are
/// never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// Request body for one assistant query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantRequest {
    pub query: String,
}
