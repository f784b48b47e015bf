//! Fleet polling loop driving every registered user's scheduler.
//!
//! One shared interval ticks all users sequentially; a second task routes
//! inbound Slack messages to the matching user's scheduler. Join handles
//! are tracked, cancellation is explicit, and stop waits for both tasks
//! with a timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use nudge_core::{parse_command, UserScheduler};

use crate::integrations::slack::InboundEvent;
use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the fleet scheduler.
#[derive(Debug, Clone)]
pub struct FleetSchedulerConfig {
    /// Interval between polling passes.
    pub poll_interval: Duration,
    /// Timeout for awaiting task join handles on stop.
    pub stop_timeout: Duration,
}

impl Default for FleetSchedulerConfig {
    fn default() -> Self {
        Self { poll_interval: Duration::from_secs(30), stop_timeout: Duration::from_secs(5) }
    }
}

/// Drives all user schedulers with explicit lifecycle management.
pub struct FleetScheduler {
    config: FleetSchedulerConfig,
    users: Arc<HashMap<String, Mutex<UserScheduler>>>,
    // Shared with the router task; reacquired on restart after stop().
    inbound: Arc<Mutex<mpsc::Receiver<InboundEvent>>>,
    tick_handle: Option<JoinHandle<()>>,
    router_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
}

impl FleetScheduler {
    pub fn new(
        config: FleetSchedulerConfig,
        schedulers: Vec<UserScheduler>,
        inbound: mpsc::Receiver<InboundEvent>,
    ) -> Self {
        let users = schedulers
            .into_iter()
            .map(|s| (s.profile().slack_user_id.clone(), Mutex::new(s)))
            .collect();
        Self {
            config,
            users: Arc::new(users),
            inbound: Arc::new(Mutex::new(inbound)),
            tick_handle: None,
            router_handle: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Start the polling loop and the inbound router.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let cancel = self.cancellation.clone();
        let users = self.users.clone();
        let poll_interval = self.config.poll_interval;
        self.tick_handle = Some(tokio::spawn(async move {
            Self::tick_loop(cancel, users, poll_interval).await;
        }));

        let cancel = self.cancellation.clone();
        let users = self.users.clone();
        let inbound = self.inbound.clone();
        self.router_handle = Some(tokio::spawn(async move {
            Self::route_inbound(cancel, users, inbound).await;
        }));

        info!(users = self.users.len(), "Fleet scheduler started");
        Ok(())
    }

    /// Cancel both tasks and wait for them to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let stop_timeout = self.config.stop_timeout;
        for handle in [self.tick_handle.take(), self.router_handle.take()].into_iter().flatten() {
            tokio::time::timeout(stop_timeout, handle)
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: stop_timeout.as_secs() })?
                .map_err(|e| SchedulerError::TaskJoinFailed(e.to_string()))?;
        }

        info!("Fleet scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true while the polling task is active.
    pub fn is_running(&self) -> bool {
        self.tick_handle.is_some()
    }

    async fn tick_loop(
        cancel: CancellationToken,
        users: Arc<HashMap<String, Mutex<UserScheduler>>>,
        poll_interval: Duration,
    ) {
        loop {
            // One timestamp per pass so every user observes the same tick.
            let now = Utc::now();
            for (user_id, scheduler) in users.iter() {
                let mut scheduler = scheduler.lock().await;
                if let Err(err) = scheduler.tick(now).await {
                    error!(user = %user_id, error = %err, "tick failed");
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Fleet tick loop cancelled");
                    return;
                }
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }
    }

    async fn route_inbound(
        cancel: CancellationToken,
        users: Arc<HashMap<String, Mutex<UserScheduler>>>,
        inbound: Arc<Mutex<mpsc::Receiver<InboundEvent>>>,
    ) {
        // Held until this task exits; stop() joins us before a restart, so
        // the next router task can always acquire it.
        let mut inbound = inbound.lock().await;
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Inbound router cancelled");
                    return;
                }
                event = inbound.recv() => match event {
                    Some(event) => event,
                    None => {
                        debug!("Inbound channel closed");
                        return;
                    }
                },
            };

            let Some(scheduler) = users.get(&event.sender_id) else {
                debug!(sender = %event.sender_id, "message from unregistered user ignored");
                continue;
            };

            let mut scheduler = scheduler.lock().await;
            let phrase = scheduler.profile().confirmation_phrase.clone();
            let Some(command) = parse_command(&event.text, &phrase) else {
                continue;
            };

            if let Err(err) = scheduler.handle_command(command, Utc::now()).await {
                error!(user = %event.sender_id, error = %err, "command handling failed");
            }
        }
    }
}

impl Drop for FleetScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("FleetScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
