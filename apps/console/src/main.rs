use std::{
    io::Write as _,
    sync::Arc,
};

use anyhow::Result;
use assistant_client::{ChatSession, HttpAssistantService};
use clap::Parser;
use map_view::{MapController, MapEvent, ViewState};
use routing::{GoogleDirectionsResolver, MissingRouteResolver, RouteResolver};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

mod config;

#[derive(Parser, Debug)]
struct Args {
    /// Assistant service base URL (overrides assistant.toml / env).
    #[arg(long)]
    assistant_url: Option<String>,
    /// Directions provider API key. Without one, routes fall back to
    /// start/end markers.
    #[arg(long)]
    maps_api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(url) = args.assistant_url {
        settings.assistant_url = url;
    }
    if let Some(key) = args.maps_api_key {
        settings.maps_api_key = Some(key);
    }

    let resolver: Arc<dyn RouteResolver> = match &settings.maps_api_key {
        Some(key) => Arc::new(GoogleDirectionsResolver::new(key.clone())),
        None => {
            warn!("no maps API key configured; routes degrade to start/end markers");
            Arc::new(MissingRouteResolver)
        }
    };

    let map = MapController::with_resolver(resolver);
    let session = ChatSession::new(
        Arc::new(HttpAssistantService::new(settings.assistant_url.clone())),
        Arc::clone(&map),
    );

    // Print map updates as they land, including late route resolutions.
    let mut map_events = map.subscribe_events();
    tokio::spawn(async move {
        while let Ok(MapEvent::ViewChanged(view)) = map_events.recv().await {
            println!("[map] {}", render_view(&view));
        }
    });

    let greeting = session
        .transcript()
        .await
        .first()
        .map(|entry| entry.text.clone())
        .unwrap_or_default();
    println!("{greeting}");
    println!("(type 'quit' to exit)\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query == "quit" || query == "exit" {
            break;
        }

        let entry = session.send_query(query).await?;
        println!("\n{}\n", entry.text);
    }

    Ok(())
}

fn render_view(view: &ViewState) -> String {
    let route = match &view.route {
        Some(overlay) => format!("route {} / {}", overlay.distance, overlay.duration),
        None => "no route".to_string(),
    };
    format!(
        "center ({}, {}) zoom {} | {} markers | {}",
        view.center.lat,
        view.center.lng,
        view.zoom,
        view.markers.len(),
        route
    )
}
