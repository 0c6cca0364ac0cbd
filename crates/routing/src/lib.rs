//! Routing provider boundary: resolving a drivable route between two
//! coordinates. The map controller only depends on the [`RouteResolver`]
//! trait; deployments without map capability plug in
//! [`MissingRouteResolver`], which fails every request and degrades the map
//! to its fallback marker state.

use async_trait::async_trait;
use serde::Deserialize;
use shared::domain::{Coordinate, TravelMode};
use thiserror::Error;
use tracing::debug;

const DIRECTIONS_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/directions/json";

#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub mode: TravelMode,
}

impl RouteRequest {
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            origin,
            destination,
            mode: TravelMode::default(),
        }
    }
}

/// A resolved route. Distance and duration are display strings owned by the
/// provider and passed through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoute {
    pub distance: String,
    pub duration: String,
    pub polyline: Option<String>,
    pub start: Coordinate,
    pub end: Coordinate,
}

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing provider is unavailable")]
    Unavailable,
    #[error("routing provider rejected the request: {0}")]
    Provider(String),
    #[error("routing request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("routing provider returned no routes")]
    NoRoutes,
}

#[async_trait]
pub trait RouteResolver: Send + Sync {
    async fn resolve(&self, request: &RouteRequest) -> Result<ResolvedRoute, RoutingError>;
}

/// Stands in when no routing provider is configured. Every request fails,
/// which callers must treat identically to a provider failure response.
pub struct MissingRouteResolver;

#[async_trait]
impl RouteResolver for MissingRouteResolver {
    async fn resolve(&self, _request: &RouteRequest) -> Result<ResolvedRoute, RoutingError> {
        Err(RoutingError::Unavailable)
    }
}

/// Resolver backed by the Google Directions HTTP API.
pub struct GoogleDirectionsResolver {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleDirectionsResolver {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, DIRECTIONS_ENDPOINT)
    }

    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl RouteResolver for GoogleDirectionsResolver {
    async fn resolve(&self, request: &RouteRequest) -> Result<ResolvedRoute, RoutingError> {
        let response: DirectionsResponse = self
            .http
            .get(&self.endpoint)
            .query(&[
                (
                    "origin",
                    format!("{},{}", request.origin.lat, request.origin.lng),
                ),
                (
                    "destination",
                    format!("{},{}", request.destination.lat, request.destination.lng),
                ),
                ("mode", request.mode.as_str().to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "OK" {
            return Err(RoutingError::Provider(response.status));
        }

        let route = response.routes.first().ok_or(RoutingError::NoRoutes)?;
        let leg = route.legs.first().ok_or(RoutingError::NoRoutes)?;
        debug!(
            distance = %leg.distance.text,
            duration = %leg.duration.text,
            "directions provider resolved route"
        );

        Ok(ResolvedRoute {
            distance: leg.distance.text.clone(),
            duration: leg.duration.text.clone(),
            polyline: route
                .overview_polyline
                .as_ref()
                .map(|polyline| polyline.points.clone()),
            start: leg.start_location.unwrap_or(request.origin),
            end: leg.end_location.unwrap_or(request.destination),
        })
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
    #[serde(default)]
    overview_polyline: Option<OverviewPolyline>,
}

#[derive(Debug, Deserialize)]
struct OverviewPolyline {
    #[serde(default)]
    points: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    #[serde(default)]
    distance: TextValue,
    #[serde(default)]
    duration: TextValue,
    #[serde(default)]
    start_location: Option<Coordinate>,
    #[serde(default)]
    end_location: Option<Coordinate>,
}

#[derive(Debug, Default, Deserialize)]
struct TextValue {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, routing::get, Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;

    async fn spawn_directions_server(body: Value) -> String {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = Router::new()
            .route(
                "/directions/json",
                get(|State(body): State<Arc<Value>>| async move { Json((*body).clone()) }),
            )
            .with_state(Arc::new(body));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}/directions/json")
    }

    fn sample_request() -> RouteRequest {
        RouteRequest::new(
            Coordinate::new(10.0312, 76.2673),
            Coordinate::new(9.9312, 76.2673),
        )
    }

    #[tokio::test]
    async fn missing_resolver_always_fails() {
        let err = MissingRouteResolver
            .resolve(&sample_request())
            .await
            .expect_err("must fail");
        assert!(matches!(err, RoutingError::Unavailable));
    }

    #[tokio::test]
    async fn resolves_first_leg_of_first_route() {
        let endpoint = spawn_directions_server(json!({
            "status": "OK",
            "routes": [{
                "legs": [{
                    "distance": {"text": "12.5 km"},
                    "duration": {"text": "25 minutes"},
                    "start_location": {"lat": 10.0312, "lng": 76.2673},
                    "end_location": {"lat": 9.9312, "lng": 76.2673}
                }],
                "overview_polyline": {"points": "abc123"}
            }]
        }))
        .await;

        let resolver = GoogleDirectionsResolver::with_endpoint("test-key", endpoint);
        let route = resolver.resolve(&sample_request()).await.expect("route");
        assert_eq!(route.distance, "12.5 km");
        assert_eq!(route.duration, "25 minutes");
        assert_eq!(route.polyline.as_deref(), Some("abc123"));
        assert_eq!(route.start, Coordinate::new(10.0312, 76.2673));
    }

    #[tokio::test]
    async fn non_ok_status_maps_to_provider_error() {
        let endpoint = spawn_directions_server(json!({
            "status": "ZERO_RESULTS",
            "routes": []
        }))
        .await;

        let resolver = GoogleDirectionsResolver::with_endpoint("test-key", endpoint);
        let err = resolver
            .resolve(&sample_request())
            .await
            .expect_err("must fail");
        match err {
            RoutingError::Provider(status) => assert_eq!(status, "ZERO_RESULTS"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn ok_status_without_routes_is_no_routes() {
        let endpoint = spawn_directions_server(json!({"status": "OK", "routes": []})).await;
        let resolver = GoogleDirectionsResolver::with_endpoint("test-key", endpoint);
        let err = resolver
            .resolve(&sample_request())
            .await
            .expect_err("must fail");
        assert!(matches!(err, RoutingError::NoRoutes));
    }
}
