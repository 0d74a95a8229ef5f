// Terminal dashboard entry point

mod config;
mod render;
mod router;

use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use router::{parse_command, route_command, Flow};
use yieldtrack::{
    DashboardError, GeminiClient, HttpSnapshotClient, IrrigationState, LiveReading, PanelState,
    Poller, PredictionPanel, SystemClock, Visibility,
};

/// Everything a command can act on
pub struct Session {
    pub poller: Poller,
    pub irrigation: IrrigationState,
    /// Holds the configuration message when prediction is unavailable
    pub panel: Result<Arc<PredictionPanel<GeminiClient>>, String>,
}

fn spawn_reading_view(mut readings: watch::Receiver<Option<LiveReading>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while readings.changed().await.is_ok() {
            let latest = readings.borrow_and_update().clone();
            if let Some(reading) = latest {
                for line in render::reading_lines(&reading) {
                    println!("{}", line);
                }
            }
        }
    })
}

fn spawn_panel_view(mut panel: watch::Receiver<PanelState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while panel.changed().await.is_ok() {
            let state = panel.borrow_and_update().clone();
            for line in render::panel_lines(&state) {
                println!("{}", line);
            }
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(config = ?config, "Dashboard starting");

    let source = Arc::new(
        HttpSnapshotClient::new(config.snapshot_url.clone(), config.http_timeout)
            .context("Failed to build snapshot client")?,
    );
    let poller = Poller::start(
        source,
        Arc::new(SystemClock::new()),
        config.poll_interval,
        Visibility::Visible,
    );

    let panel = match GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.http_timeout,
    ) {
        Ok(client) => Ok(Arc::new(PredictionPanel::new(client, config.indicator_delay))),
        Err(DashboardError::Config(message)) => {
            warn!(reason = %message, "Yield prediction disabled");
            Err(message)
        }
        Err(e) => return Err(e).context("Failed to build completion client"),
    };

    let reading_view = spawn_reading_view(poller.subscribe());
    let panel_view = match &panel {
        Ok(panel) => Some(spawn_panel_view(panel.subscribe())),
        Err(_) => None,
    };

    let mut session = Session {
        poller,
        irrigation: IrrigationState::default(),
        panel,
    };

    println!("{}", router::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    info!("Input closed");
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(command)) => {
                        if route_command(command, &mut session) == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{}", e),
                }
            }
        }
    }

    // Detach the views first so any late prediction result is discarded
    reading_view.abort();
    if let Some(view) = panel_view {
        view.abort();
    }
    session.poller.stop().await;

    info!("Dashboard stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_panel_view_ends_when_panel_dropped() {
        let client = GeminiClient::new(
            Some("test-key".to_string()),
            "gemini-2.0-flash",
            Duration::from_secs(1),
        )
        .unwrap();
        let panel = PredictionPanel::new(client, Duration::from_millis(10));
        let view = spawn_panel_view(panel.subscribe());

        drop(panel);
        tokio::time::timeout(Duration::from_secs(1), view)
            .await
            .unwrap()
            .unwrap();
    }
}
