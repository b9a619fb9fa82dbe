//! crates/remotenet_core/src/machine.rs
//!
//! The session state machine: `Disconnected -> Connecting -> Connected -> Disconnected`.
//!
//! Usage counters only move while `Connected`, one step per tick. Every return to
//! `Disconnected` wipes the counters and the sample history, so a fresh session
//! always starts from the origin sample.

use crate::{
    credentials::CredentialStore,
    domain::{ConnectionStatus, Credentials, TerminationReason, UsageSample},
    error::{AuthError, SessionError, SessionResult},
    policy::UsagePolicy,
};
use rand::Rng;
use std::ops::Range;
use tracing::{debug, info};

/// Simulated data consumed per tick, in MB.
pub const TICK_USAGE_MB: Range<f64> = 1.0..6.0;
/// Simulated time that passes per tick, in minutes.
pub const TICK_MINUTES: u32 = 1;

/// What a single tick did to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Still within both limits; carries the sample that was recorded.
    Running(UsageSample),
    /// A limit was hit and the session dropped back to `Disconnected`.
    Terminated(TerminationReason),
}

#[derive(Debug)]
pub struct SessionMachine {
    status: ConnectionStatus,
    data_used_mb: f64,
    elapsed_minutes: u32,
    samples: Vec<UsageSample>,
    /// Number of receivers admitted so far. Survives disconnects.
    admissions: u64,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            data_used_mb: 0.0,
            elapsed_minutes: 0,
            samples: vec![UsageSample::ORIGIN],
            admissions: 0,
        }
    }
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn data_used_mb(&self) -> f64 {
        self.data_used_mb
    }

    pub fn elapsed_minutes(&self) -> u32 {
        self.elapsed_minutes
    }

    pub fn samples(&self) -> &[UsageSample] {
        &self.samples
    }

    /// The admission number of the live link, if a receiver is connected.
    pub fn connected_run(&self) -> Option<u64> {
        (self.status == ConnectionStatus::Connected).then_some(self.admissions)
    }

    /// `Disconnected -> Connecting`, provided the policy has usable limits.
    pub fn start_sharing(&mut self, policy: &UsagePolicy) -> SessionResult<()> {
        if self.status != ConnectionStatus::Disconnected {
            return Err(SessionError::AlreadySharing);
        }
        policy.validate_for_start()?;

        self.status = ConnectionStatus::Connecting;
        info!(
            "Sharing started: cap {} MB, duration {} min.",
            policy.data_cap_mb(),
            policy.duration_minutes()
        );
        Ok(())
    }

    /// `Connecting -> Connected` when the submitted credentials match.
    /// Returns the admission number identifying this link.
    ///
    /// A mismatch is reported before readiness, so a receiver with the wrong
    /// password never learns whether the provider is waiting.
    pub fn admit_receiver(
        &mut self,
        store: &CredentialStore,
        submitted: &Credentials,
    ) -> Result<u64, AuthError> {
        if !store.verify(&submitted.identifier, &submitted.secret) {
            debug!("Rejected receiver '{}': credential mismatch.", submitted.identifier);
            return Err(AuthError::InvalidCredentials);
        }
        if self.status != ConnectionStatus::Connecting {
            debug!("Rejected receiver: status is {}.", self.status);
            return Err(AuthError::ProviderNotReady);
        }

        self.status = ConnectionStatus::Connected;
        self.admissions += 1;
        info!(
            "Receiver '{}' connected (link {}).",
            submitted.identifier, self.admissions
        );
        Ok(self.admissions)
    }

    /// Advances the session by one tick with a pseudo-random amount of usage.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        policy: &UsagePolicy,
        rng: &mut R,
    ) -> SessionResult<TickOutcome> {
        let delta_mb = rng.gen_range(TICK_USAGE_MB);
        self.tick_with(policy, delta_mb)
    }

    /// Advances the session by one tick consuming exactly `delta_mb`.
    ///
    /// Limits are checked against the post-update values, data cap first.
    pub fn tick_with(&mut self, policy: &UsagePolicy, delta_mb: f64) -> SessionResult<TickOutcome> {
        if self.status != ConnectionStatus::Connected {
            return Err(SessionError::NotConnected);
        }

        self.data_used_mb += delta_mb.max(0.0);
        self.elapsed_minutes += TICK_MINUTES;
        let sample = UsageSample {
            time_minutes: self.elapsed_minutes,
            usage_mb: self.data_used_mb,
        };
        self.samples.push(sample);

        let reason = if self.data_used_mb >= policy.data_cap_mb() {
            Some(TerminationReason::DataCapReached)
        } else if f64::from(self.elapsed_minutes) >= policy.duration_minutes() {
            Some(TerminationReason::DurationReached)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                info!(
                    "Session terminated after {} min and {:.1} MB: {}.",
                    self.elapsed_minutes, self.data_used_mb, reason
                );
                self.disconnect();
                Ok(TickOutcome::Terminated(reason))
            }
            None => Ok(TickOutcome::Running(sample)),
        }
    }

    /// Drops back to `Disconnected` from any other status.
    /// Returns `None` (and changes nothing) if already disconnected.
    pub fn stop_sharing(&mut self) -> Option<TerminationReason> {
        if self.status == ConnectionStatus::Disconnected {
            return None;
        }
        info!("Sharing stopped by user from {}.", self.status);
        self.disconnect();
        Some(TerminationReason::UserStopped)
    }

    fn disconnect(&mut self) {
        *self = Self {
            admissions: self.admissions,
            ..Self::default()
        };
    }
}
