//! services/api/src/web/usage_task.rs
//!
//! The periodic "worker" functions that run while a session is connected: the
//! usage tick that advances the session, and the display-only bandwidth sampler.
//! Both stop as soon as their `CancellationToken` fires.

use crate::web::state::SessionHub;
use remotenet_core::BandwidthSample;
use std::{sync::Arc, time::Duration};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Advances the session's usage counters once per `period`.
pub async fn usage_tick_process(hub: Arc<SessionHub>, period: Duration, token: CancellationToken) {
    info!("Usage tick process started ({:?} per tick).", period);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!("Usage tick process cancelled.");
                return;
            }
            _ = ticker.tick() => hub.tick(&token).await,
        }
    }
}

/// Publishes a fresh simulated link speed once per `period`.
///
/// Samples go through the hub's lock, which drops them once `token` is
/// cancelled, so a tick racing the disconnect cannot land after the idle reading.
pub async fn bandwidth_process(hub: Arc<SessionHub>, period: Duration, token: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = ticker.tick() => {
                let sample = BandwidthSample::live(&mut rand::thread_rng());
                hub.publish_bandwidth(&token, sample).await;
            }
        }
    }
}
