//! services/api/src/web/state.rs
//!
//! Defines the application's shared state: the single sharing session, the timers
//! that drive it while connected, and the broadcast channel clients listen on.

use crate::{
    config::Config,
    web::{
        protocol::{ServerMessage, SessionSnapshot},
        speed_test::speed_test_process,
        usage_task::{bandwidth_process, usage_tick_process},
    },
};
use remotenet_core::{
    Action, BandwidthSample, ConnectionStatus, Outcome, Role, SessionError, SessionResult,
    ShareSession, SpeedAdvisoryService, TerminationReason, TickOutcome, ViewState,
};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

const EVENT_CHANNEL_CAPACITY: usize = 64;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<SessionHub>,
}

//=========================================================================================
// Hub Events
//=========================================================================================

/// What the hub tells every connected client.
#[derive(Debug, Clone)]
pub enum HubEvent {
    /// Session state moved; each client re-renders its own snapshot.
    SessionChanged,
    /// A message every client receives unchanged.
    Broadcast(ServerMessage),
}

/// Simulation timings, taken from `Config`.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub tick_interval: Duration,
    pub bandwidth_interval: Duration,
    pub speed_test_delay: Duration,
}

impl From<&Config> for Timings {
    fn from(config: &Config) -> Self {
        Self {
            tick_interval: config.tick_interval,
            bandwidth_interval: config.bandwidth_interval,
            speed_test_delay: config.speed_test_delay,
        }
    }
}

//=========================================================================================
// Timers Owned By A Connected Session
//=========================================================================================

/// The periodic tasks that only exist while the session is `Connected`.
struct ConnectedTimers {
    run_id: Uuid,
    token: CancellationToken,
    _handles: Vec<JoinHandle<()>>,
}

impl ConnectedTimers {
    fn cancel(self) {
        debug!("Cancelling timers for run {}", self.run_id);
        self.token.cancel();
    }
}

struct PendingSpeedTest {
    id: Uuid,
    token: CancellationToken,
}

struct HubInner {
    session: ShareSession,
    timers: Option<ConnectedTimers>,
    speed_test: Option<PendingSpeedTest>,
}

//=========================================================================================
// SessionHub
//=========================================================================================

/// Owns the process-wide `ShareSession`.
///
/// Every mutation goes through the inner mutex. Timers are started and cancelled
/// inside the same critical section that changes the status, and each timer
/// re-checks its token under the lock, so a cancelled timer can never touch the
/// session again.
pub struct SessionHub {
    inner: Mutex<HubInner>,
    events: broadcast::Sender<HubEvent>,
    advisory: Option<Arc<dyn SpeedAdvisoryService>>,
    timings: Timings,
}

impl SessionHub {
    pub fn new(timings: Timings, advisory: Option<Arc<dyn SpeedAdvisoryService>>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            inner: Mutex::new(HubInner {
                session: ShareSession::new(),
                timers: None,
                speed_test: None,
            }),
            events,
            advisory,
            timings,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.events.subscribe()
    }

    pub fn advisory(&self) -> Option<&dyn SpeedAdvisoryService> {
        self.advisory.as_deref()
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.inner.lock().await.session.status()
    }

    pub async fn snapshot(&self, view: &ViewState) -> SessionSnapshot {
        let inner = self.inner.lock().await;
        SessionSnapshot::new(&inner.session, view, inner.speed_test.is_some())
    }

    pub(crate) fn publish(&self, event: HubEvent) {
        // No subscribers is fine; nobody is watching.
        let _ = self.events.send(event);
    }

    /// Applies a client's action to the session and brings timers in line
    /// with the resulting status.
    pub async fn dispatch(self: &Arc<Self>, view: &mut ViewState, action: Action) -> SessionResult<Outcome> {
        let mut inner = self.inner.lock().await;
        let result = inner.session.dispatch(view, action);
        self.reconcile(&mut inner);

        if let Ok(outcome) = &result {
            if let Some(reason) = outcome.terminated {
                self.publish_termination(reason);
            }
            self.publish(HubEvent::SessionChanged);
        }
        result
    }

    /// One usage tick. Ignored if `token` was cancelled, i.e. the run it
    /// belonged to is over.
    pub(crate) async fn tick(self: &Arc<Self>, token: &CancellationToken) {
        let mut inner = self.inner.lock().await;
        if token.is_cancelled() {
            debug!("Dropping tick from a finished run.");
            return;
        }

        let outcome = inner.session.tick(&mut rand::thread_rng());
        match outcome {
            Ok(TickOutcome::Running(sample)) => {
                debug!(
                    "Tick: {} min, {:.1} MB used.",
                    sample.time_minutes, sample.usage_mb
                );
            }
            Ok(TickOutcome::Terminated(reason)) => {
                self.reconcile(&mut inner);
                self.publish_termination(reason);
            }
            Err(e) => {
                warn!("Tick rejected: {}", e);
                self.reconcile(&mut inner);
                return;
            }
        }
        self.publish(HubEvent::SessionChanged);
    }

    /// Publishes a bandwidth reading produced under `token`. Dropped if the
    /// run is over, so nothing live can follow the idle reading sent on disconnect.
    pub(crate) async fn publish_bandwidth(&self, token: &CancellationToken, sample: BandwidthSample) {
        let _inner = self.inner.lock().await;
        if token.is_cancelled() {
            debug!("Dropping bandwidth sample from a finished run.");
            return;
        }
        self.publish(HubEvent::Broadcast(ServerMessage::bandwidth(sample)));
    }

    /// Starts a simulated speed test for the connected receiver owning `view`;
    /// the result arrives later as a broadcast.
    pub async fn start_speed_test(self: &Arc<Self>, view: &ViewState) -> SessionResult<()> {
        view.require_role(Role::Receiver)?;
        let mut inner = self.inner.lock().await;
        if !inner.session.holds_link(view) {
            return Err(SessionError::NotConnected);
        }
        if inner.speed_test.is_some() {
            return Err(SessionError::SpeedTestInFlight);
        }
        let Some(timers) = inner.timers.as_ref() else {
            return Err(SessionError::NotConnected);
        };

        let pending = PendingSpeedTest {
            id: Uuid::new_v4(),
            token: timers.token.child_token(),
        };
        let result = BandwidthSample::speed_test(&mut rand::thread_rng());
        info!("Speed test {} started.", pending.id);

        tokio::spawn(speed_test_process(
            self.clone(),
            pending.id,
            result,
            pending.token.clone(),
        ));
        inner.speed_test = Some(pending);

        self.publish(HubEvent::Broadcast(ServerMessage::SpeedTestStarted));
        self.publish(HubEvent::SessionChanged);
        Ok(())
    }

    /// Ends speed test `id`, publishing `result` unless `token` was cancelled
    /// first, and clears the in-flight marker if it is still the current one.
    pub(crate) async fn finish_speed_test(
        &self,
        id: Uuid,
        token: &CancellationToken,
        result: Option<ServerMessage>,
    ) {
        let mut inner = self.inner.lock().await;
        match result {
            Some(msg) if !token.is_cancelled() => self.publish(HubEvent::Broadcast(msg)),
            Some(_) => info!("Speed test {} finished after its run ended; result dropped.", id),
            None => {}
        }
        if inner.speed_test.as_ref().is_some_and(|p| p.id == id) {
            inner.speed_test = None;
            self.publish(HubEvent::SessionChanged);
        }
    }

    fn publish_termination(&self, reason: TerminationReason) {
        self.publish(HubEvent::Broadcast(ServerMessage::terminated(reason)));
        self.publish(HubEvent::Broadcast(ServerMessage::notification(
            &reason.notice(),
        )));
    }

    /// Starts the timers on entering `Connected` and tears them down on leaving it.
    fn reconcile(self: &Arc<Self>, inner: &mut HubInner) {
        let connected = inner.session.machine().connected_run().is_some();
        match (connected, inner.timers.is_some()) {
            (true, false) => inner.timers = Some(self.spawn_timers()),
            (false, true) => {
                if let Some(timers) = inner.timers.take() {
                    timers.cancel();
                }
                if let Some(pending) = inner.speed_test.take() {
                    pending.token.cancel();
                }
                self.publish(HubEvent::Broadcast(ServerMessage::bandwidth(
                    BandwidthSample::IDLE,
                )));
            }
            _ => {}
        }
    }

    fn spawn_timers(self: &Arc<Self>) -> ConnectedTimers {
        let run_id = Uuid::new_v4();
        let token = CancellationToken::new();
        info!("Session connected; starting timers for run {}", run_id);

        let tick = tokio::spawn(usage_tick_process(
            self.clone(),
            self.timings.tick_interval,
            token.clone(),
        ));
        let bandwidth = tokio::spawn(bandwidth_process(
            self.clone(),
            self.timings.bandwidth_interval,
            token.clone(),
        ));

        ConnectedTimers {
            run_id,
            token,
            _handles: vec![tick, bandwidth],
        }
    }
}
