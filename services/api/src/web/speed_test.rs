//! services/api/src/web/speed_test.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! a single simulated speed test and its advisory text.

use crate::web::{protocol::ServerMessage, state::SessionHub};
use remotenet_core::{ports::advise, BandwidthSample};
use std::{sync::Arc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// Waits out the simulated test, publishes the measured speeds, then asks the
/// advisory service what they are good for.
///
/// The test is abandoned without a result if `token` is cancelled, which
/// happens when the session leaves `Connected`.
pub async fn speed_test_process(
    hub: Arc<SessionHub>,
    id: Uuid,
    result: BandwidthSample,
    token: CancellationToken,
) {
    let start_time = Instant::now();

    tokio::select! {
        biased;
        _ = token.cancelled() => {
            info!("Speed test {} abandoned during measurement.", id);
            hub.finish_speed_test(id, &token, None).await;
            return;
        }
        _ = tokio::time::sleep(hub.timings().speed_test_delay) => {}
    }

    hub.publish_bandwidth(&token, result).await;

    let analysis = tokio::select! {
        biased;
        _ = token.cancelled() => {
            info!("Speed test {} abandoned while waiting for advisory.", id);
            hub.finish_speed_test(id, &token, None).await;
            return;
        }
        text = advise(hub.advisory(), result.download_mbps, result.upload_mbps) => text,
    };

    info!(
        "⏱️ Speed test {} took: {:?} ({:.1}/{:.1} Mbps)",
        id,
        start_time.elapsed(),
        result.download_mbps,
        result.upload_mbps
    );
    let message = ServerMessage::SpeedTestResult {
        download_mbps: result.download_mbps,
        upload_mbps: result.upload_mbps,
        analysis,
    };
    hub.finish_speed_test(id, &token, Some(message)).await;
}
