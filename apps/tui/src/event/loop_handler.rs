use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyEventKind};
use std::time::Duration;

use crate::app::{handle_input, App};
use crate::config::ViewerConfig;
use crate::domain::ScanSnapshot;
use crate::fetcher::{HttpSource, SnapshotSource};
use crate::geometry::{count_in_zone, suggest_threshold};
use crate::terminal::Tui;
use crate::ui;

/// Run a single fetch without a UI and print what the gate sees
pub async fn run_headless(config: &ViewerConfig, json: bool) -> Result<()> {
    let url = config.scan_url();
    let source = HttpSource::new(url.clone(), config.units, config.request_timeout)?;
    tracing::info!(%url, "Fetching one snapshot");

    let snapshot = source
        .fetch()
        .await
        .map_err(|e| eyre!("{} ({e})", e.user_message()))?;
    let stats = build_headless_stats(&url, &snapshot);

    if json {
        let json = serde_json::to_string_pretty(&stats)?;
        println!("{json}");
    } else {
        render_headless_stats(&stats);
    }

    Ok(())
}

fn render_headless_stats(stats: &HeadlessStats) {
    println!("\nLidar Gate Snapshot");
    println!("===================");
    println!("Endpoint: {}", stats.url);
    println!("Received: {}", stats.received_at);
    println!("Points: {}", stats.points);
    println!("In gate zone: {}", stats.in_zone);
    println!("Gate threshold: {:.1}", stats.gate_threshold);
    match stats.suggested_threshold {
        Some(suggested) => println!("Suggested threshold: {suggested:.1}"),
        None => println!("Suggested threshold: n/a (nothing in the forward cone)"),
    }
}

fn build_headless_stats(url: &str, snapshot: &ScanSnapshot) -> HeadlessStats {
    HeadlessStats {
        url: url.to_string(),
        received_at: snapshot.received_at.to_rfc3339(),
        points: snapshot.points.len(),
        in_zone: count_in_zone(snapshot),
        gate_threshold: snapshot.gate_threshold,
        suggested_threshold: suggest_threshold(&snapshot.points),
    }
}

#[derive(Debug, serde::Serialize)]
struct HeadlessStats {
    url: String,
    received_at: String,
    points: usize,
    in_zone: usize,
    gate_threshold: f64,
    suggested_threshold: Option<f64>,
}

fn draw(terminal: &mut Tui, app: &App) -> Result<()> {
    terminal
        .draw(|f| ui::ui(app, f))
        .map_err(|e| eyre!("Terminal draw error: {e}"))?;
    Ok(())
}

/// Run the main application event loop
pub async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    // Configure event poll timeout (ms)
    const EVENT_POLL_TIMEOUT: u64 = 50;

    draw(terminal, app)?;

    while app.running {
        if app.update() {
            draw(terminal, app)?;
        }

        if matches!(
            event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT)),
            Ok(true)
        ) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    handle_input(app, key.code);
                    if app.running {
                        draw(terminal, app)?;
                    }
                }
                Ok(Event::Resize(_, _)) => draw(terminal, app)?,
                Ok(_) | Err(_) => {}
            }
        }

        // Let fetch tasks make progress between input polls
        tokio::task::yield_now().await;
    }

    Ok(())
}
