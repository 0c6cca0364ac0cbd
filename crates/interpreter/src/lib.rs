//! Response interpreter: turns one assistant result payload into the reply
//! text for the transcript plus at most one map command.
//!
//! The composition order mirrors the assistant backend's response shape:
//! later result kinds overwrite the headline of earlier ones (places, then
//! directions, then geocode), while suggestions are always appended at the
//! end regardless of which branch produced the headline.

use std::fmt::Write as _;

use shared::{
    payload::{AssistantPayload, GeocodeResult, Place, RouteInfo},
    protocol::MapCommand,
};

pub const FALLBACK_REPLY: &str = "I'm not sure about that.";
const MAX_LISTED_PLACES: usize = 3;
const MAX_LISTED_STEPS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub reply: String,
    pub command: MapCommand,
}

/// Pure and infallible: malformed-but-present optional fields are omitted
/// from the composed text, never surfaced as errors.
pub fn interpret(payload: &AssistantPayload) -> Interpretation {
    let mut reply = payload
        .reply
        .clone()
        .unwrap_or_else(|| FALLBACK_REPLY.to_string());
    let mut command = MapCommand::None;

    if !payload.places.is_empty() {
        reply = compose_places_reply(&payload.places);
        command = MapCommand::Places(payload.places.clone());
    }

    if let Some(directions) = &payload.directions {
        reply = compose_directions_reply(directions);
        command = MapCommand::Directions(directions.clone());
    }

    if !payload.locations.is_empty() {
        reply = compose_geocode_reply(&payload.locations[0]);
        command = MapCommand::Geocode(payload.locations.clone());
    }

    if !payload.suggestions.is_empty() {
        reply.push_str("\n\n💡 Suggestions:\n");
        for suggestion in &payload.suggestions {
            let _ = writeln!(reply, "• {}", suggestion.message);
        }
    }

    Interpretation { reply, command }
}

fn compose_places_reply(places: &[Place]) -> String {
    let mut reply = format!("Found {} places:\n\n", places.len());
    for (index, place) in places.iter().take(MAX_LISTED_PLACES).enumerate() {
        let _ = writeln!(reply, "{}. {}", index + 1, place.name);
        if let Some(address) = &place.address {
            let _ = writeln!(reply, "   📍 {address}");
        }
        if let Some(rating) = place.rating {
            let _ = writeln!(reply, "   ⭐ {rating}/5");
        }
        reply.push('\n');
    }
    reply
}

fn compose_directions_reply(directions: &RouteInfo) -> String {
    let mut reply = format!(
        "🗺️ Route from {} to {}\n\n",
        directions.start_address, directions.end_address
    );
    let _ = writeln!(reply, "📏 Distance: {}", directions.distance);
    let _ = writeln!(reply, "⏱️ Duration: {}", directions.duration);
    reply.push('\n');

    if !directions.steps.is_empty() {
        reply.push_str("Turn-by-turn directions:\n");
        for (index, step) in directions.steps.iter().take(MAX_LISTED_STEPS).enumerate() {
            let _ = writeln!(reply, "{}. {} ({})", index + 1, step.instruction, step.distance);
        }
    }
    reply
}

fn compose_geocode_reply(location: &GeocodeResult) -> String {
    let mut reply = String::from("📍 Location found:\n");
    let _ = writeln!(reply, "Address: {}", location.formatted_address);
    if let Some(coordinate) = location.coordinate() {
        let _ = write!(reply, "Coordinates: {}, {}", coordinate.lat, coordinate.lng);
    }
    reply
}
