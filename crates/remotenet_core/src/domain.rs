//! crates/remotenet_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or serialization format.

use std::fmt;

/// The part a client plays in a sharing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Provider,
    Receiver,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Provider => write!(f, "provider"),
            Role::Receiver => write!(f, "receiver"),
        }
    }
}

/// The identifier/secret pair a provider hands out and a receiver types back in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

/// Connection status of the (simulated) link between provider and receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connecting => write!(f, "Connecting"),
            ConnectionStatus::Connected => write!(f, "Connected"),
        }
    }
}

/// One point of the usage history, recorded once per tick while connected.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UsageSample {
    pub time_minutes: u32,
    pub usage_mb: f64,
}

impl UsageSample {
    /// The sample every history starts with.
    pub const ORIGIN: UsageSample = UsageSample {
        time_minutes: 0,
        usage_mb: 0.0,
    };
}

/// Why a session went back to `Disconnected`.
///
/// This is not a failure; it tags the transition so the presentation layer can
/// tell the user what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    DataCapReached,
    DurationReached,
    UserStopped,
}

impl TerminationReason {
    pub fn notice(self) -> Notice {
        match self {
            TerminationReason::DataCapReached => {
                Notice::error("Data limit reached. Connection terminated.")
            }
            TerminationReason::DurationReached => {
                Notice::error("Time limit reached. Connection terminated.")
            }
            TerminationReason::UserStopped => Notice::info("Sharing has been stopped."),
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::DataCapReached => write!(f, "data_cap_reached"),
            TerminationReason::DurationReached => write!(f, "duration_reached"),
            TerminationReason::UserStopped => write!(f, "user_stopped"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeKind::Success => write!(f, "success"),
            NoticeKind::Error => write!(f, "error"),
            NoticeKind::Info => write!(f, "info"),
        }
    }
}

/// A user-facing notification produced by a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }
}

// Display-only link speed; never feeds back into session state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandwidthSample {
    pub download_mbps: f64,
    pub upload_mbps: f64,
}

impl BandwidthSample {
    pub const IDLE: BandwidthSample = BandwidthSample {
        download_mbps: 0.0,
        upload_mbps: 0.0,
    };

    /// A live reading while connected: 5-50 Mbps down, 2-20 Mbps up.
    pub fn live<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            download_mbps: rng.gen_range(5.0..50.0),
            upload_mbps: rng.gen_range(2.0..20.0),
        }
    }

    /// The final result of an explicit speed test: 15-90 Mbps down, 5-30 Mbps up.
    pub fn speed_test<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            download_mbps: rng.gen_range(15.0..90.0),
            upload_mbps: rng.gen_range(5.0..30.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn bandwidth_samples_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let live = BandwidthSample::live(&mut rng);
            assert!((5.0..50.0).contains(&live.download_mbps));
            assert!((2.0..20.0).contains(&live.upload_mbps));

            let tested = BandwidthSample::speed_test(&mut rng);
            assert!((15.0..90.0).contains(&tested.download_mbps));
            assert!((5.0..30.0).contains(&tested.upload_mbps));
        }
    }

    #[test]
    fn termination_reasons_map_to_distinct_notices() {
        assert_eq!(
            TerminationReason::DataCapReached.notice().message,
            "Data limit reached. Connection terminated."
        );
        assert_eq!(
            TerminationReason::DurationReached.notice().message,
            "Time limit reached. Connection terminated."
        );
        assert_eq!(TerminationReason::UserStopped.notice().kind, NoticeKind::Info);
    }
}
