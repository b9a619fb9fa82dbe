//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server,
//! and the session snapshot that both the socket and the REST endpoint hand out.

use chrono::{DateTime, Utc};
use remotenet_core::{
    status_banner, Action, BandwidthSample, Credentials, Notice, Role, ShareSession,
    TerminationReason, UsageSample, ViewState,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoleDto {
    Provider,
    Receiver,
}

impl From<RoleDto> for Role {
    fn from(role: RoleDto) -> Self {
        match role {
            RoleDto::Provider => Role::Provider,
            RoleDto::Receiver => Role::Receiver,
        }
    }
}

impl From<Role> for RoleDto {
    fn from(role: Role) -> Self {
        match role {
            Role::Provider => RoleDto::Provider,
            Role::Receiver => RoleDto::Receiver,
        }
    }
}

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Picks provider or receiver. Allowed once until the client logs out.
    SelectRole { role: RoleDto },

    /// Provider only: issues the credentials a receiver must type in.
    CreateCredentials { identifier: String, secret: String },

    /// Receiver only: asks to join the provider's session.
    ConnectReceiver { identifier: String, secret: String },

    /// Provider only: edits the usage limits. Rejected while sharing.
    ConfigurePolicy {
        data_cap_gb: f64,
        duration_hours: f64,
        #[serde(default)]
        allowed_sites: String,
    },

    StartSharing,

    StopSharing,

    /// Runs a simulated speed test and asks the advisory service about it.
    RunSpeedTest,

    /// The header's logout/back button.
    Logout,
}

impl ClientMessage {
    /// The session action this message maps to. Speed tests are not session
    /// actions and yield `None`.
    pub fn into_action(self) -> Option<Action> {
        let action = match self {
            ClientMessage::SelectRole { role } => Action::SelectRole(role.into()),
            ClientMessage::CreateCredentials { identifier, secret } => {
                Action::CreateCredentials(Credentials::new(identifier, secret))
            }
            ClientMessage::ConnectReceiver { identifier, secret } => {
                Action::ConnectReceiver(Credentials::new(identifier, secret))
            }
            ClientMessage::ConfigurePolicy {
                data_cap_gb,
                duration_hours,
                allowed_sites,
            } => Action::ConfigurePolicy {
                data_cap_gb,
                duration_hours,
                allowed_sites,
            },
            ClientMessage::StartSharing => Action::StartSharing,
            ClientMessage::StopSharing => Action::StopSharing,
            ClientMessage::Logout => Action::Logout,
            ClientMessage::RunSpeedTest => return None,
        };
        Some(action)
    }
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The full state this client should render.
    Snapshot(SessionSnapshot),

    /// A toast-style notification.
    Notification {
        kind: String,
        message: String,
        at: DateTime<Utc>,
    },

    /// The session dropped back to `Disconnected`.
    SessionTerminated { reason: String },

    /// Display-only link speed.
    Bandwidth { download_mbps: f64, upload_mbps: f64 },

    SpeedTestStarted,

    SpeedTestResult {
        download_mbps: f64,
        upload_mbps: f64,
        analysis: String,
    },

    /// Reports a malformed or rejected request.
    Error { message: String },
}

impl ServerMessage {
    pub fn notification(notice: &Notice) -> Self {
        ServerMessage::Notification {
            kind: notice.kind.to_string(),
            message: notice.message.clone(),
            at: Utc::now(),
        }
    }

    pub fn terminated(reason: TerminationReason) -> Self {
        ServerMessage::SessionTerminated {
            reason: reason.to_string(),
        }
    }

    pub fn bandwidth(sample: BandwidthSample) -> Self {
        ServerMessage::Bandwidth {
            download_mbps: sample.download_mbps,
            upload_mbps: sample.upload_mbps,
        }
    }
}

//=========================================================================================
// Session Snapshot
//=========================================================================================

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct UsageSampleDto {
    pub time_minutes: u32,
    pub usage_mb: f64,
}

impl From<&UsageSample> for UsageSampleDto {
    fn from(sample: &UsageSample) -> Self {
        Self {
            time_minutes: sample.time_minutes,
            usage_mb: sample.usage_mb,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct PolicyDto {
    pub data_cap_gb: f64,
    pub duration_hours: f64,
    pub allowed_sites: String,
    pub allowed_sites_list: Vec<String>,
    /// Limits may only be edited while this is true.
    pub editable: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct StatusBannerDto {
    pub title: String,
    pub subtitle: String,
}

/// Everything a client needs to render its current screen.
#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct SessionSnapshot {
    /// One of `role_selection`, `credentials_setup`, `credentials_entry`, `dashboard`.
    pub screen: String,
    pub role: Option<RoleDto>,
    /// One of `Disconnected`, `Connecting`, `Connected`.
    pub status: String,
    /// `Logout`, `Back`, or absent.
    pub header_action: Option<String>,
    pub banner: StatusBannerDto,
    pub last_error: Option<String>,
    pub credentials_issued: bool,
    pub policy: PolicyDto,
    pub data_used_mb: f64,
    pub elapsed_minutes: u32,
    pub data_cap_mb: f64,
    pub duration_minutes: f64,
    pub data_used_percent: f64,
    pub time_used_percent: f64,
    pub samples: Vec<UsageSampleDto>,
    pub speed_test_running: bool,
}

impl SessionSnapshot {
    pub fn new(session: &ShareSession, view: &ViewState, speed_test_running: bool) -> Self {
        let status = session.status();
        let policy = session.policy();
        let machine = session.machine();
        let (title, subtitle) = status_banner(status);

        Self {
            screen: view.render(status).tag().to_string(),
            role: view.role().map(RoleDto::from),
            status: status.to_string(),
            header_action: view.header_action().map(str::to_string),
            banner: StatusBannerDto {
                title: title.to_string(),
                subtitle: subtitle.to_string(),
            },
            last_error: view.last_error().map(str::to_string),
            credentials_issued: session.credentials().issued().is_some(),
            policy: PolicyDto {
                data_cap_gb: policy.data_cap_gb,
                duration_hours: policy.duration_hours,
                allowed_sites: policy.allowed_sites.clone(),
                allowed_sites_list: policy
                    .allowed_sites_list()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                editable: status == remotenet_core::ConnectionStatus::Disconnected,
            },
            data_used_mb: machine.data_used_mb(),
            elapsed_minutes: machine.elapsed_minutes(),
            data_cap_mb: policy.data_cap_mb(),
            duration_minutes: policy.duration_minutes(),
            data_used_percent: policy.data_used_percent(machine.data_used_mb()),
            time_used_percent: policy.time_used_percent(machine.elapsed_minutes()),
            samples: machine.samples().iter().map(UsageSampleDto::from).collect(),
            speed_test_running,
        }
    }
}
