//! The assistant-service result payload. Any subset of the optional fields
//! may be present simultaneously; coordinate-bearing records arrive in more
//! than one shape depending on which provider produced them, so every record
//! keeps both forms and resolves through an accessor.

use serde::{Deserialize, Serialize};

use crate::domain::Coordinate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantPayload {
    /// Intent tag emitted by the assistant backend. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub places: Vec<Place>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directions: Option<RouteInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<GeocodeResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "vicinity", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Nested coordinate form (`{"location": {"lat": …, "lng": …}}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    /// 0–5 provider rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// 0–4 provider price level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
}

impl Place {
    /// Nested form wins over the flat `lat`/`lng` pair. A place without a
    /// resolvable coordinate is skipped when building markers but still
    /// counts toward reply text.
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.location.or(match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinate { lat, lng }),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    #[serde(default)]
    pub start_address: String,
    #[serde(default)]
    pub end_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_location: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_location: Option<Coordinate>,
    #[serde(default)]
    pub distance: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<RouteStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polyline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub distance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    #[serde(default, alias = "address")]
    pub formatted_address: String,
    #[serde(default, alias = "lat", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lng", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl GeocodeResult {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinate { lat, lng }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: String,
}
