mod animator;
mod configuration;
mod error;
mod eta;
mod geo_math;
mod live_provider;
mod poll_loop;
mod presenter;
mod progress;
mod progress_store;
mod route_source;
mod web;

use anyhow::{Context, Result};
use log::info;
use tokio::sync::mpsc;

use crate::configuration::Configuration;
use crate::live_provider::HttpRouteProvider;
use crate::poll_loop::PollLoop;
use crate::presenter::SharedDisplay;
use crate::progress::ProgressEstimator;
use crate::progress_store::{MemoryProgressStore, ProgressStore, SqliteProgressStore};
use crate::route_source::RouteSource;

fn progress_store(config: &Configuration) -> Result<Box<dyn ProgressStore>> {
    let store: Box<dyn ProgressStore> = match &config.db_path {
        Some(path) => {
            info!("Keeping cursor state in {}", path.display());
            Box::new(SqliteProgressStore::open(path)?)
        }
        None => Box::<MemoryProgressStore>::default(),
    };
    Ok(store)
}

async fn run(config: Configuration) -> Result<()> {
    let provider = config
        .live_url
        .clone()
        .map(|url| HttpRouteProvider::new(url, config.live_token.clone()));
    if provider.is_none() {
        info!("No live provider configured, serving bundled routes");
    }

    let estimator = ProgressEstimator::new(progress_store(&config)?);
    if let Some(state) = estimator.state(&config.route_id)? {
        info!(
            "Resuming {} at waypoint {}",
            config.route_id,
            state.waypoint_index + 1
        );
    }
    let (events_tx, events_rx) = mpsc::channel(16);
    let poll = PollLoop::new(&config, RouteSource::new(provider), estimator, events_tx).start();

    let display = SharedDisplay::default();
    let consumer = tokio::spawn(presenter::consume_events(display.clone(), events_rx));
    let ticker = presenter::start_frame_ticker(display.clone(), config.frame_interval);

    tokio::select! {
        _ = web::serve(display, config.port) => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Listen for shutdown signal")?;
            info!("Shutting down");
        }
    }

    poll.abort();
    ticker.abort();
    consumer.abort();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let config = Configuration::from_env()?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Build tokio runtime")?;
    rt.block_on(run(config))
}
