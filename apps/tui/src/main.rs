use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use lidar_gate_viz::app::App;
use lidar_gate_viz::cli::CliArgs;
use lidar_gate_viz::config::{get_log_path, ViewerConfig};
use lidar_gate_viz::fetcher::HttpSource;
use lidar_gate_viz::messaging::{connect_relay, CommandOpener};
use lidar_gate_viz::{event, logging, terminal};

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    color_eyre::install()?;

    let args = CliArgs::parse();
    args.apply_env_overrides();
    let config = ViewerConfig::from_env()?;

    // Check if we're running in a terminal
    if args.headless || !is_terminal() {
        logging::init_stderr(args.debug)?;
        return event::run_headless(&config, args.json).await;
    }

    logging::init_file(&get_log_path(), args.debug)?;

    let source = HttpSource::new(config.scan_url(), config.units, config.request_timeout)?;
    tracing::info!(url = %source.url(), role = ?args.role, "Starting lidar gate viewer");
    let mut app = App::new(config, args.role);

    if let Some(relay) = args.relay.as_deref() {
        match connect_relay(relay).await {
            Ok(channel) => app = app.with_channel(Box::new(channel)),
            Err(e) => {
                tracing::warn!(%relay, error = %e, "Relay unavailable, continuing without it");
            }
        }
    }
    if let Some(program) = args.open_with.as_deref() {
        app = app.with_opener(Box::new(CommandOpener::new(program)));
    }

    // Setup terminal
    let mut terminal = terminal::setup()?;

    app.activate(Arc::new(source));
    let result = event::run(&mut terminal, &mut app).await;
    app.deactivate();

    // Restore terminal
    terminal::cleanup(true, true);

    result
}

// Check if we're running in a terminal
fn is_terminal() -> bool {
    atty::is(atty::Stream::Stdout)
}
