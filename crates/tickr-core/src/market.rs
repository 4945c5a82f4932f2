//! Background market status polling.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::gateway::{Gateway, GatewayError};
use crate::{MarketStatus, UtcDateTime};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Latest observation published by the poller.
///
/// A failed poll keeps the last known `status` and records `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatusState {
    pub status: Option<MarketStatus>,
    pub error: Option<String>,
    pub updated_at: Option<UtcDateTime>,
}

pub struct MarketStatusPoller {
    gateway: Arc<dyn Gateway>,
    interval: Duration,
}

impl MarketStatusPoller {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Starts polling on a tokio task. The first poll happens immediately.
    pub fn spawn(self) -> MarketStatusHandle {
        let (state_tx, state_rx) = watch::channel(MarketStatusState::default());
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = self.interval.as_secs(), "market status poller started");

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let result = self.gateway.market_status().await;
                        state_tx.send_modify(|state| apply(state, result));
                    }
                }
            }

            info!("market status poller stopped");
        });

        MarketStatusHandle {
            state: state_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

fn apply(state: &mut MarketStatusState, result: Result<MarketStatus, GatewayError>) {
    state.updated_at = Some(UtcDateTime::now());
    match result {
        Ok(status) => {
            debug!(open = status.open, "market status polled");
            state.status = Some(status);
            state.error = None;
        }
        Err(error) => {
            warn!(%error, "market status poll failed");
            state.error = Some(error.message().to_owned());
        }
    }
}

/// Owner of a running poller. Dropping it aborts the task.
pub struct MarketStatusHandle {
    state: watch::Receiver<MarketStatusState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MarketStatusHandle {
    pub fn current(&self) -> MarketStatusState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MarketStatusState> {
        self.state.clone()
    }

    /// Waits for the next published state. Returns `None` once the poller stopped.
    pub async fn changed(&mut self) -> Option<MarketStatusState> {
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().clone())
    }

    /// Stops the poller and waits for its task to finish.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                warn!(%error, "market status poller task failed");
            }
        }
    }
}

impl Drop for MarketStatusHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
