//! `nudged`: meeting reminder daemon.
//!
//! Wires the crates together: loads configuration, registers each user's
//! calendar client, starts the fleet polling loop and the HTTP server for
//! the Slack events webhook and health probe, then waits for Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::routing::get;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use nudge_core::UserScheduler;
use nudge_infra::http::HttpClient;
use nudge_infra::{
    config, events_router, FleetScheduler, FleetSchedulerConfig, GoogleCalendarClient, SlackClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so it can feed both the filter and the config loader.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::load().context("loading configuration")?;
    let tz = config.digest.tz().context("parsing timezone")?;

    let http = HttpClient::builder().build().context("building http client")?;
    let notifier = Arc::new(SlackClient::new(http.clone(), config.slack.bot_token.clone()));

    let mut schedulers = Vec::new();
    for user in &config.users {
        let calendar = GoogleCalendarClient::new(
            http.clone(),
            config.google.clone(),
            user.google_calendar_id.clone(),
            user.google_refresh_token.clone(),
            tz,
            user.label(),
        );
        // Verify credentials now so a bad refresh token surfaces at startup
        // instead of on the first poll. The rest of the fleet keeps running.
        if let Err(err) = calendar.authenticate().await {
            error!(user = %user.label(), error = %err, "calendar registration failed, skipping user");
            continue;
        }
        let scheduler = UserScheduler::new(
            user.clone(),
            config.scheduler.clone(),
            config.digest.clone(),
            Arc::new(calendar),
            notifier.clone(),
        )?;
        info!(user = %user.label(), "user registered");
        schedulers.push(scheduler);
    }
    if schedulers.is_empty() {
        anyhow::bail!("no users passed calendar registration");
    }

    let (tx, rx) = mpsc::channel(64);
    let fleet_config = FleetSchedulerConfig {
        poll_interval: Duration::from_secs(config.scheduler.poll_interval_seconds),
        ..Default::default()
    };
    let mut fleet = FleetScheduler::new(fleet_config, schedulers, rx);

    let app = events_router(tx).route("/health", get(|| async { "ok" }));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding port {}", config.port))?;
    info!(port = config.port, "http server listening");
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    fleet.start().context("starting fleet scheduler")?;

    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("shutdown signal received, stopping");

    fleet.stop().await.context("stopping fleet scheduler")?;
    server.abort();
    Ok(())
}
