//! Map visualization controller: owns the derived view state (camera,
//! markers, route overlay, selection) and updates it from map commands.
//!
//! Applying a command replaces the active one atomically. `Directions`
//! commands kick off an asynchronous route resolution; a monotonic command
//! sequence number guards against a late completion overwriting state that
//! belongs to a newer command.

use std::{sync::Arc, time::Duration};

use routing::{MissingRouteResolver, RouteRequest, RouteResolver};
use serde::Serialize;
use shared::{
    domain::Coordinate,
    payload::{GeocodeResult, Place, RouteInfo},
    protocol::MapCommand,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub const PLACES_ZOOM: u8 = 14;
pub const GEOCODE_ZOOM: u8 = 15;
pub const ROUTE_ZOOM: u8 = 10;
pub const ROUTE_FALLBACK_ZOOM: u8 = 12;
/// Initial camera: Kochi.
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 9.9312,
    lng: 76.2673,
};
pub const DEFAULT_ZOOM: u8 = 12;
const ROUTE_RESOLUTION_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Place,
    Location,
    RouteStart,
    RouteEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: Coordinate,
    pub label: String,
    pub kind: MarkerKind,
}

/// The rendered path plus its own start/end markers once a route has been
/// resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOverlay {
    pub polyline: Option<String>,
    pub distance: String,
    pub duration: String,
    pub start: Coordinate,
    pub end: Coordinate,
}

/// Read-only render state for the map surface. `selected` is an index into
/// `markers`; it is cleared whenever the active command changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub center: Coordinate,
    pub zoom: u8,
    pub markers: Vec<Marker>,
    pub route: Option<RouteOverlay>,
    pub selected: Option<usize>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            markers: Vec::new(),
            route: None,
            selected: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum MapEvent {
    ViewChanged(ViewState),
}

pub struct MapController {
    resolver: Arc<dyn RouteResolver>,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<MapEvent>,
}

struct ControllerState {
    view: ViewState,
    command_seq: u64,
}

impl MapController {
    /// Controller without a routing provider: `Directions` commands degrade
    /// to the fallback marker state.
    pub fn new() -> Arc<Self> {
        Self::with_resolver(Arc::new(MissingRouteResolver))
    }

    pub fn with_resolver(resolver: Arc<dyn RouteResolver>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            resolver,
            inner: Mutex::new(ControllerState {
                view: ViewState::default(),
                command_seq: 0,
            }),
            events,
        })
    }

    /// Replace the active command and derive the new view state. For
    /// `Directions` a resolution task is spawned; everything else applies
    /// synchronously.
    pub async fn apply_command(self: &Arc<Self>, command: MapCommand) {
        let mut guard = self.inner.lock().await;
        guard.command_seq += 1;
        let seq = guard.command_seq;
        guard.view.selected = None;
        guard.view.route = None;

        match command {
            MapCommand::None => {
                guard.view.markers.clear();
            }
            MapCommand::Places(places) => apply_places(&mut guard.view, &places),
            MapCommand::Geocode(locations) => apply_geocode(&mut guard.view, &locations),
            MapCommand::Directions(info) => {
                install_route_endpoints(&mut guard.view, &info);
                match (info.start_location, info.end_location) {
                    (Some(origin), Some(destination)) => {
                        let controller = Arc::clone(self);
                        tokio::spawn(async move {
                            controller.resolve_route(seq, origin, destination).await;
                        });
                    }
                    _ => {
                        warn!("directions command is missing coordinates; keeping fallback markers");
                        apply_route_failure(&mut guard.view, info.start_location);
                    }
                }
            }
        }

        self.emit_view(&guard.view);
    }

    async fn resolve_route(self: Arc<Self>, seq: u64, origin: Coordinate, destination: Coordinate) {
        let request = RouteRequest::new(origin, destination);
        let outcome =
            tokio::time::timeout(ROUTE_RESOLUTION_TIMEOUT, self.resolver.resolve(&request)).await;

        let mut guard = self.inner.lock().await;
        if guard.command_seq != seq {
            info!(
                resolved_seq = seq,
                active_seq = guard.command_seq,
                "discarding stale route resolution"
            );
            return;
        }

        match outcome {
            Ok(Ok(route)) => {
                guard.view.route = Some(RouteOverlay {
                    polyline: route.polyline,
                    distance: route.distance,
                    duration: route.duration,
                    start: route.start,
                    end: route.end,
                });
                guard.view.zoom = ROUTE_ZOOM;
                // The overlay carries its own start/end markers.
                guard.view.markers.clear();
            }
            Ok(Err(err)) => {
                warn!("route resolution failed: {err}");
                apply_route_failure(&mut guard.view, Some(origin));
            }
            Err(_) => {
                warn!(
                    timeout_secs = ROUTE_RESOLUTION_TIMEOUT.as_secs(),
                    "route resolution timed out"
                );
                apply_route_failure(&mut guard.view, Some(origin));
            }
        }

        self.emit_view(&guard.view);
    }

    /// Marker-click feedback from the map surface. Out-of-range indexes are
    /// ignored.
    pub async fn select_marker(&self, index: usize) {
        let mut guard = self.inner.lock().await;
        if index >= guard.view.markers.len() {
            return;
        }
        guard.view.selected = Some(index);
        self.emit_view(&guard.view);
    }

    pub async fn clear_selection(&self) {
        let mut guard = self.inner.lock().await;
        if guard.view.selected.take().is_some() {
            self.emit_view(&guard.view);
        }
    }

    /// Consistent snapshot of the current view state.
    pub async fn view_state(&self) -> ViewState {
        self.inner.lock().await.view.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<MapEvent> {
        self.events.subscribe()
    }

    fn emit_view(&self, view: &ViewState) {
        let _ = self.events.send(MapEvent::ViewChanged(view.clone()));
    }
}

fn apply_places(view: &mut ViewState, places: &[Place]) {
    view.markers = places
        .iter()
        .filter_map(|place| {
            place.coordinate().map(|position| Marker {
                position,
                label: place.name.clone(),
                kind: MarkerKind::Place,
            })
        })
        .collect();
    if let Some(first) = view.markers.first() {
        view.center = first.position;
        view.zoom = PLACES_ZOOM;
    }
}

fn apply_geocode(view: &mut ViewState, locations: &[GeocodeResult]) {
    view.markers = locations
        .iter()
        .filter_map(|location| {
            location.coordinate().map(|position| Marker {
                position,
                label: location.formatted_address.clone(),
                kind: MarkerKind::Location,
            })
        })
        .collect();
    if let Some(first) = view.markers.first() {
        view.center = first.position;
        view.zoom = GEOCODE_ZOOM;
    }
}

/// Start/end fallback markers shown while a route is pending and after a
/// failed resolution.
fn install_route_endpoints(view: &mut ViewState, info: &RouteInfo) {
    view.markers.clear();
    if let Some(start) = info.start_location {
        view.markers.push(Marker {
            position: start,
            label: info.start_address.clone(),
            kind: MarkerKind::RouteStart,
        });
    }
    if let Some(end) = info.end_location {
        view.markers.push(Marker {
            position: end,
            label: info.end_address.clone(),
            kind: MarkerKind::RouteEnd,
        });
    }
}

fn apply_route_failure(view: &mut ViewState, start: Option<Coordinate>) {
    view.route = None;
    if let Some(start) = start {
        view.center = start;
    }
    view.zoom = ROUTE_FALLBACK_ZOOM;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
