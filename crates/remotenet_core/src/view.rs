//! crates/remotenet_core/src/view.rs
//!
//! Per-client navigation state and the pure routing function that turns it,
//! together with the session status, into the screen a client should show.

use crate::{
    domain::{ConnectionStatus, Role},
    error::{SessionError, SessionResult},
};
use std::fmt;

/// The named views a client can be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewTag {
    #[default]
    RoleSelection,
    CredentialsSetup,
    CredentialsEntry,
    Dashboard,
}

/// What a client should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    RoleSelection,
    CredentialsSetup { error: Option<String> },
    CredentialsEntry { error: Option<String> },
    Dashboard { role: Role, status: ConnectionStatus },
}

impl Screen {
    pub fn tag(&self) -> ViewTag {
        match self {
            Screen::RoleSelection => ViewTag::RoleSelection,
            Screen::CredentialsSetup { .. } => ViewTag::CredentialsSetup,
            Screen::CredentialsEntry { .. } => ViewTag::CredentialsEntry,
            Screen::Dashboard { .. } => ViewTag::Dashboard,
        }
    }
}

impl fmt::Display for ViewTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewTag::RoleSelection => write!(f, "role_selection"),
            ViewTag::CredentialsSetup => write!(f, "credentials_setup"),
            ViewTag::CredentialsEntry => write!(f, "credentials_entry"),
            ViewTag::Dashboard => write!(f, "dashboard"),
        }
    }
}

/// Maps navigation state and session status to a screen.
///
/// Any view other than role selection needs a role; without one the client is
/// sent back to the start.
pub fn route(
    view: ViewTag,
    role: Option<Role>,
    status: ConnectionStatus,
    last_error: Option<&str>,
) -> Screen {
    let error = last_error.map(str::to_string);
    match (view, role) {
        (ViewTag::RoleSelection, _) | (_, None) => Screen::RoleSelection,
        (ViewTag::CredentialsSetup, Some(_)) => Screen::CredentialsSetup { error },
        (ViewTag::CredentialsEntry, Some(_)) => Screen::CredentialsEntry { error },
        (ViewTag::Dashboard, Some(role)) => Screen::Dashboard { role, status },
    }
}

/// Headline and subtext describing the provider's sharing status.
pub fn status_banner(status: ConnectionStatus) -> (&'static str, &'static str) {
    match status {
        ConnectionStatus::Connected => ("Sharing Active", "Connection is live and secure"),
        ConnectionStatus::Connecting => (
            "Waiting for Receiver",
            "Session is ready for a user to connect",
        ),
        ConnectionStatus::Disconnected => ("Sharing Inactive", "Configure and start a session"),
    }
}

/// Navigation state owned by one client connection.
#[derive(Debug, Default)]
pub struct ViewState {
    view: ViewTag,
    role: Option<Role>,
    last_error: Option<String>,
    /// Link number this receiver was admitted with.
    admitted_run: Option<u64>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> ViewTag {
        self.view
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn admitted_run(&self) -> Option<u64> {
        self.admitted_run
    }

    pub fn render(&self, status: ConnectionStatus) -> Screen {
        route(self.view, self.role, status, self.last_error())
    }

    /// The label of the header's escape action, if one is shown.
    pub fn header_action(&self) -> Option<&'static str> {
        self.role?;
        match self.view {
            ViewTag::Dashboard => Some("Logout"),
            ViewTag::CredentialsSetup | ViewTag::CredentialsEntry => Some("Back"),
            ViewTag::RoleSelection => None,
        }
    }

    /// Fixes the role for this client and moves to its credentials screen.
    pub fn select_role(&mut self, role: Role) -> SessionResult<ViewTag> {
        if self.role.is_some() {
            return Err(SessionError::RoleAlreadySelected);
        }
        self.role = Some(role);
        self.last_error = None;
        self.view = match role {
            Role::Provider => ViewTag::CredentialsSetup,
            Role::Receiver => ViewTag::CredentialsEntry,
        };
        Ok(self.view)
    }

    pub fn require_role(&self, role: Role) -> SessionResult<()> {
        match self.role {
            Some(r) if r == role => Ok(()),
            Some(r) => Err(SessionError::WrongRole(r.to_string())),
            None => Err(SessionError::WrongRole("unselected".to_string())),
        }
    }

    pub fn show_dashboard(&mut self) {
        self.view = ViewTag::Dashboard;
        self.last_error = None;
    }

    /// Records a successful admission and moves to the dashboard.
    pub fn admit(&mut self, run: u64) {
        self.admitted_run = Some(run);
        self.show_dashboard();
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_selection_routes_to_matching_credentials_screen() {
        let mut provider = ViewState::new();
        assert_eq!(provider.select_role(Role::Provider), Ok(ViewTag::CredentialsSetup));
        assert_eq!(
            provider.render(ConnectionStatus::Disconnected),
            Screen::CredentialsSetup { error: None }
        );

        let mut receiver = ViewState::new();
        assert_eq!(receiver.select_role(Role::Receiver), Ok(ViewTag::CredentialsEntry));
        assert_eq!(receiver.header_action(), Some("Back"));
    }

    #[test]
    fn role_is_fixed_until_reset() {
        let mut view = ViewState::new();
        view.select_role(Role::Provider).unwrap();
        assert_eq!(
            view.select_role(Role::Receiver),
            Err(SessionError::RoleAlreadySelected)
        );

        view.reset();
        assert_eq!(view.role(), None);
        assert_eq!(view.render(ConnectionStatus::Connected), Screen::RoleSelection);
        assert!(view.select_role(Role::Receiver).is_ok());
    }

    #[test]
    fn dashboard_carries_role_and_status() {
        let mut view = ViewState::new();
        view.select_role(Role::Receiver).unwrap();
        view.set_error("Invalid credentials. Please check and try again.");
        view.show_dashboard();

        assert_eq!(view.last_error(), None);
        assert_eq!(view.header_action(), Some("Logout"));
        assert_eq!(
            view.render(ConnectionStatus::Connected),
            Screen::Dashboard {
                role: Role::Receiver,
                status: ConnectionStatus::Connected
            }
        );
    }

    #[test]
    fn views_without_a_role_fall_back_to_role_selection() {
        let screen = route(ViewTag::Dashboard, None, ConnectionStatus::Connected, None);
        assert_eq!(screen, Screen::RoleSelection);
        assert_eq!(ViewState::new().header_action(), None);
    }

    #[test]
    fn entry_screen_shows_last_error() {
        let screen = route(
            ViewTag::CredentialsEntry,
            Some(Role::Receiver),
            ConnectionStatus::Disconnected,
            Some("nope"),
        );
        assert_eq!(
            screen,
            Screen::CredentialsEntry {
                error: Some("nope".to_string())
            }
        );
    }

    #[test]
    fn require_role_rejects_other_roles() {
        let mut view = ViewState::new();
        assert!(view.require_role(Role::Provider).is_err());
        view.select_role(Role::Receiver).unwrap();
        assert_eq!(
            view.require_role(Role::Provider),
            Err(SessionError::WrongRole("receiver".to_string()))
        );
        assert!(view.require_role(Role::Receiver).is_ok());
    }

    #[test]
    fn admission_is_forgotten_on_reset() {
        let mut view = ViewState::new();
        view.select_role(Role::Receiver).unwrap();
        view.admit(3);
        assert_eq!(view.admitted_run(), Some(3));
        assert_eq!(view.view(), ViewTag::Dashboard);

        view.reset();
        assert_eq!(view.admitted_run(), None);
    }
}
