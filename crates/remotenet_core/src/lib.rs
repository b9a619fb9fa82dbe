pub mod credentials;
pub mod domain;
pub mod error;
pub mod machine;
pub mod policy;
pub mod ports;
pub mod session;
pub mod view;

pub use credentials::{CredentialStore, MIN_CREDENTIAL_LEN};
pub use domain::{
    BandwidthSample, ConnectionStatus, Credentials, Notice, NoticeKind, Role, TerminationReason,
    UsageSample,
};
pub use error::{AuthError, CredentialError, PolicyError, SessionError, SessionResult};
pub use machine::{SessionMachine, TickOutcome};
pub use policy::UsagePolicy;
pub use ports::{advise, PortError, PortResult, SpeedAdvisoryService};
pub use session::{Action, Outcome, ShareSession};
pub use view::{route, status_banner, Screen, ViewState, ViewTag};
