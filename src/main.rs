use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use youarehere::http::build_client;
use youarehere::location::{FixedLocationSource, NominatimGeocoder};
use youarehere::narration::{status_text, NarrationEvent, OrchestratorBuilder, OrchestratorHandle};
use youarehere::speech::{ProxySpeechClient, RodioPlayer};
use youarehere::summary::ProxySummaryClient;
use youarehere::AppConfig;

/// You Are Here: hear something interesting about where you are.
#[derive(Debug, Parser)]
#[command(name = "youarehere", version, after_help = COMMANDS_HELP)]
struct Cli {
    /// Config file (default: <config dir>/youarehere/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Latitude to narrate, overriding [location] in the config
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude to narrate, overriding [location] in the config
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
}

const COMMANDS_HELP: &str = r#"While running, type a command and press Enter:
  (empty) or r   refresh now
  s              stop narration
  q              quit"#;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "youarehere=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
        config = config.with_location(lat, lon);
        config.validate()?;
    }

    info!("Starting You Are Here");
    if config.coordinates().is_none() {
        warn!("No location configured; pass --lat/--lon or add a [location] table");
    }

    let client = build_client(config.request_timeout())?;
    let (orchestrator, handle) = OrchestratorBuilder::new()
        .with_config(config.narration.clone())
        .with_location_source(Arc::new(FixedLocationSource::new(config.coordinates())))
        .with_geocoder(Arc::new(NominatimGeocoder::new(
            client.clone(),
            config.geocoder_url.clone(),
        )))
        .with_summary_service(Arc::new(ProxySummaryClient::new(
            client.clone(),
            &config.proxy_base_url,
            config.client_api_key.clone(),
        )))
        .with_speech_service(Arc::new(ProxySpeechClient::new(client, &config.proxy_base_url)))
        .with_player(Box::new(RodioPlayer::new()?))
        .build()?;

    let narration_thread = orchestrator.start()?;
    spawn_command_reader(handle.clone())?;

    let mut last_line = String::new();
    for event in handle.event_receiver() {
        let line = match event {
            NarrationEvent::StateChanged(snapshot) => status_text(&snapshot, None),
            NarrationEvent::Progress { percent, .. } => status_text(&handle.snapshot(), Some(percent)),
            NarrationEvent::Countdown(_) => continue,
            NarrationEvent::Shutdown => break,
        };

        if line != last_line {
            println!("{}", line);
            last_line = line;
        }
    }

    narration_thread
        .join()
        .map_err(|_| anyhow!("narration thread panicked"))?;

    info!("Goodbye");
    Ok(())
}

/// Read single-letter commands from stdin until `q` or end of input
fn spawn_command_reader(handle: OrchestratorHandle) -> Result<()> {
    thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };

                let sent = match line.trim() {
                    "" | "r" => handle.request_refresh(),
                    "s" => handle.cancel_narration(),
                    "q" => break,
                    other => {
                        eprintln!("Unknown command {:?}\n{}", other, COMMANDS_HELP);
                        Ok(())
                    }
                };

                if sent.is_err() {
                    return;
                }
            }

            let _ = handle.shutdown();
        })?;

    Ok(())
}
