//! crates/remotenet_core/src/session.rs
//!
//! The process-wide sharing session: one credential pair, one usage policy and
//! one state machine, created and torn down together. User actions arrive as
//! [`Action`]s and are applied against the session plus the acting client's
//! [`ViewState`].

use crate::{
    credentials::CredentialStore,
    domain::{ConnectionStatus, Credentials, Notice, Role, TerminationReason},
    error::{AuthError, SessionError, SessionResult},
    machine::{SessionMachine, TickOutcome},
    policy::UsagePolicy,
    view::{ViewState, ViewTag},
};
use rand::Rng;
use tracing::{info, warn};

/// A user-initiated request.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectRole(Role),
    CreateCredentials(Credentials),
    ConnectReceiver(Credentials),
    ConfigurePolicy {
        data_cap_gb: f64,
        duration_hours: f64,
        allowed_sites: String,
    },
    StartSharing,
    StopSharing,
    Logout,
}

/// The visible effects of a successfully applied action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub notice: Option<Notice>,
    pub terminated: Option<TerminationReason>,
}

impl Outcome {
    fn notice(notice: Notice) -> Self {
        Self {
            notice: Some(notice),
            terminated: None,
        }
    }

    fn terminated(reason: Option<TerminationReason>) -> Self {
        Self {
            notice: reason.map(TerminationReason::notice),
            terminated: reason,
        }
    }
}

impl SessionError {
    /// The toast to show for a rejected action. Credential problems are shown
    /// inline on the form instead, except for a provider that isn't ready yet.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            SessionError::Validation(_) | SessionError::Auth(AuthError::InvalidCredentials) => None,
            SessionError::Auth(AuthError::ProviderNotReady) => {
                Some(Notice::error("Provider is not ready."))
            }
            other => Some(Notice::error(other.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct ShareSession {
    credentials: CredentialStore,
    policy: UsagePolicy,
    machine: SessionMachine,
}

impl ShareSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn policy(&self) -> &UsagePolicy {
        &self.policy
    }

    pub fn machine(&self) -> &SessionMachine {
        &self.machine
    }

    pub fn status(&self) -> ConnectionStatus {
        self.machine.status()
    }

    pub fn issue_credentials(&mut self, identifier: &str, secret: &str) -> SessionResult<Credentials> {
        Ok(self.credentials.issue(identifier, secret)?)
    }

    /// Limits can only be edited while nothing is being shared.
    pub fn configure_policy(
        &mut self,
        data_cap_gb: f64,
        duration_hours: f64,
        allowed_sites: String,
    ) -> SessionResult<()> {
        if self.status() != ConnectionStatus::Disconnected {
            return Err(SessionError::PolicyLocked);
        }
        self.policy.configure(data_cap_gb, duration_hours, allowed_sites);
        Ok(())
    }

    pub fn start_sharing(&mut self) -> SessionResult<()> {
        self.machine.start_sharing(&self.policy)
    }

    pub fn admit_receiver(&mut self, submitted: &Credentials) -> SessionResult<u64> {
        Ok(self.machine.admit_receiver(&self.credentials, submitted)?)
    }

    /// Whether `view` belongs to the receiver of the link that is live right now.
    /// A receiver left over from an earlier link does not count.
    pub fn holds_link(&self, view: &ViewState) -> bool {
        view.role() == Some(Role::Receiver)
            && view.admitted_run().is_some()
            && view.admitted_run() == self.machine.connected_run()
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SessionResult<TickOutcome> {
        self.machine.tick(&self.policy, rng)
    }

    pub fn tick_with(&mut self, delta_mb: f64) -> SessionResult<TickOutcome> {
        self.machine.tick_with(&self.policy, delta_mb)
    }

    pub fn stop_sharing(&mut self) -> Option<TerminationReason> {
        self.machine.stop_sharing()
    }

    /// Full teardown: stops sharing and destroys the issued credentials.
    /// The usage policy survives as the provider's last settings.
    pub fn reset(&mut self) -> Option<TerminationReason> {
        let stopped = self.stop_sharing();
        self.credentials.clear();
        info!("Session reset.");
        stopped
    }

    /// Applies one user action on behalf of the client owning `view`.
    pub fn dispatch(&mut self, view: &mut ViewState, action: Action) -> SessionResult<Outcome> {
        match action {
            Action::SelectRole(role) => {
                view.select_role(role)?;
                Ok(Outcome::default())
            }
            Action::CreateCredentials(creds) => {
                view.require_role(Role::Provider)?;
                if self.status() != ConnectionStatus::Disconnected {
                    return Err(SessionError::AlreadySharing);
                }
                if let Err(e) = self.issue_credentials(&creds.identifier, &creds.secret) {
                    view.set_error(e.to_string());
                    return Err(e);
                }
                view.show_dashboard();
                Ok(Outcome::notice(Notice::success(
                    "Session created. Start sharing when you are ready.",
                )))
            }
            Action::ConnectReceiver(creds) => {
                view.require_role(Role::Receiver)?;
                view.clear_error();
                match self.admit_receiver(&creds) {
                    Ok(run) => view.admit(run),
                    Err(e) => {
                        view.set_error(e.to_string());
                        return Err(e);
                    }
                }
                Ok(Outcome::notice(Notice::success("Connection successful!")))
            }
            Action::ConfigurePolicy {
                data_cap_gb,
                duration_hours,
                allowed_sites,
            } => {
                view.require_role(Role::Provider)?;
                self.configure_policy(data_cap_gb, duration_hours, allowed_sites)?;
                Ok(Outcome::default())
            }
            Action::StartSharing => {
                view.require_role(Role::Provider)?;
                self.start_sharing()?;
                Ok(Outcome::notice(Notice::info("Waiting for receiver to connect...")))
            }
            Action::StopSharing => match view.role() {
                Some(Role::Provider) if view.view() == ViewTag::Dashboard => {
                    Ok(Outcome::terminated(self.stop_sharing()))
                }
                Some(Role::Receiver) if self.holds_link(view) => {
                    Ok(Outcome::terminated(self.stop_sharing()))
                }
                Some(Role::Receiver) => Err(SessionError::NotConnected),
                _ => Err(SessionError::NotPermitted),
            },
            Action::Logout => Ok(Outcome::terminated(self.logout(view))),
        }
    }

    /// The header's logout/back action.
    ///
    /// A provider on its dashboard owns the session, so leaving tears it down
    /// completely; backing out of the setup screen changes nothing. A receiver
    /// only drops its own link, and only while that link is still the live one.
    fn logout(&mut self, view: &mut ViewState) -> Option<TerminationReason> {
        let stopped = match (view.role(), view.view()) {
            (Some(Role::Provider), ViewTag::Dashboard) => self.reset(),
            (Some(Role::Provider), _) => None,
            (Some(Role::Receiver), _) if self.holds_link(view) => self.stop_sharing(),
            (Some(Role::Receiver), _) => None,
            (None, _) => {
                warn!("Logout requested before a role was selected.");
                None
            }
        };
        view.reset();
        stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::UsageSample, error::PolicyError, view::Screen};

    fn provider_with_session(session: &mut ShareSession) -> ViewState {
        let mut view = ViewState::new();
        session.dispatch(&mut view, Action::SelectRole(Role::Provider)).unwrap();
        session
            .dispatch(&mut view, Action::CreateCredentials(Credentials::new("abcd", "1234")))
            .unwrap();
        view
    }

    fn receiver(session: &mut ShareSession) -> ViewState {
        let mut view = ViewState::new();
        session.dispatch(&mut view, Action::SelectRole(Role::Receiver)).unwrap();
        view
    }

    #[test]
    fn full_provider_receiver_flow() {
        let mut session = ShareSession::new();
        let mut provider = provider_with_session(&mut session);
        assert_eq!(provider.view(), ViewTag::Dashboard);

        let outcome = session.dispatch(&mut provider, Action::StartSharing).unwrap();
        assert_eq!(outcome.notice, Some(Notice::info("Waiting for receiver to connect...")));
        assert_eq!(session.status(), ConnectionStatus::Connecting);

        let mut receiver = receiver(&mut session);
        let outcome = session
            .dispatch(
                &mut receiver,
                Action::ConnectReceiver(Credentials::new("abcd", "1234")),
            )
            .unwrap();
        assert_eq!(outcome.notice, Some(Notice::success("Connection successful!")));
        assert_eq!(
            receiver.render(session.status()),
            Screen::Dashboard {
                role: Role::Receiver,
                status: ConnectionStatus::Connected
            }
        );
    }

    #[test]
    fn short_credentials_stay_on_setup_with_inline_error() {
        let mut session = ShareSession::new();
        let mut view = ViewState::new();
        session.dispatch(&mut view, Action::SelectRole(Role::Provider)).unwrap();

        let err = session
            .dispatch(&mut view, Action::CreateCredentials(Credentials::new("ab", "1234")))
            .unwrap_err();
        assert_eq!(err.notice(), None);
        assert_eq!(view.view(), ViewTag::CredentialsSetup);
        assert_eq!(
            view.last_error(),
            Some("User ID and Password must be at least 4 characters long.")
        );
        assert!(session.credentials().issued().is_none());
    }

    #[test]
    fn receiver_errors_distinguish_not_ready_from_mismatch() {
        let mut session = ShareSession::new();
        let _provider = provider_with_session(&mut session);
        let mut view = receiver(&mut session);

        let err = session
            .dispatch(&mut view, Action::ConnectReceiver(Credentials::new("abcd", "1234")))
            .unwrap_err();
        assert_eq!(err, SessionError::Auth(AuthError::ProviderNotReady));
        assert_eq!(err.notice(), Some(Notice::error("Provider is not ready.")));
        assert_eq!(
            view.last_error(),
            Some("Provider has not started the sharing session yet. Please wait.")
        );

        let err = session
            .dispatch(&mut view, Action::ConnectReceiver(Credentials::new("abcd", "nope")))
            .unwrap_err();
        assert_eq!(err, SessionError::Auth(AuthError::InvalidCredentials));
        assert_eq!(err.notice(), None);
        assert_eq!(view.view(), ViewTag::CredentialsEntry);
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn invalid_limits_surface_an_error_notice() {
        let mut session = ShareSession::new();
        let mut provider = provider_with_session(&mut session);
        session
            .dispatch(
                &mut provider,
                Action::ConfigurePolicy {
                    data_cap_gb: 0.0,
                    duration_hours: 1.0,
                    allowed_sites: String::new(),
                },
            )
            .unwrap();

        let err = session.dispatch(&mut provider, Action::StartSharing).unwrap_err();
        assert_eq!(err, SessionError::Policy(PolicyError::InvalidLimits));
        assert_eq!(
            err.notice(),
            Some(Notice::error("Data Cap and Duration must be greater than 0."))
        );
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn policy_is_locked_while_sharing() {
        let mut session = ShareSession::new();
        session.start_sharing().unwrap();
        assert_eq!(
            session.configure_policy(10.0, 1.0, String::new()),
            Err(SessionError::PolicyLocked)
        );
        assert_eq!(session.policy().data_cap_gb, 5.0);

        session.stop_sharing();
        session.configure_policy(10.0, 1.0, "a.com".into()).unwrap();
        assert_eq!(session.policy().data_cap_gb, 10.0);
    }

    #[test]
    fn only_providers_start_sharing() {
        let mut session = ShareSession::new();
        let mut view = receiver(&mut session);
        assert!(matches!(
            session.dispatch(&mut view, Action::StartSharing),
            Err(SessionError::WrongRole(_))
        ));
    }

    #[test]
    fn stop_sharing_twice_matches_stopping_once() {
        let mut session = ShareSession::new();
        let mut provider = provider_with_session(&mut session);
        session.dispatch(&mut provider, Action::StartSharing).unwrap();

        let first = session.dispatch(&mut provider, Action::StopSharing).unwrap();
        assert_eq!(first.terminated, Some(TerminationReason::UserStopped));
        assert_eq!(first.notice, Some(Notice::info("Sharing has been stopped.")));

        let second = session.dispatch(&mut provider, Action::StopSharing).unwrap();
        assert_eq!(second, Outcome::default());
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
        assert_eq!(session.machine().samples(), &[UsageSample::ORIGIN]);
    }

    #[test]
    fn provider_logout_tears_down_everything() {
        let mut session = ShareSession::new();
        let mut provider = provider_with_session(&mut session);
        session.dispatch(&mut provider, Action::StartSharing).unwrap();
        let mut receiver = receiver(&mut session);
        session
            .dispatch(&mut receiver, Action::ConnectReceiver(Credentials::new("abcd", "1234")))
            .unwrap();
        session.tick_with(12.0).unwrap();

        let outcome = session.dispatch(&mut provider, Action::Logout).unwrap();
        assert_eq!(outcome.terminated, Some(TerminationReason::UserStopped));
        assert_eq!(provider.render(session.status()), Screen::RoleSelection);
        assert_eq!(provider.role(), None);
        assert!(!session.credentials().verify("abcd", "1234"));
        assert_eq!(session.machine().data_used_mb(), 0.0);
    }

    #[test]
    fn receiver_back_before_admission_leaves_provider_waiting() {
        let mut session = ShareSession::new();
        let mut provider = provider_with_session(&mut session);
        session.dispatch(&mut provider, Action::StartSharing).unwrap();

        let mut view = receiver(&mut session);
        let outcome = session.dispatch(&mut view, Action::Logout).unwrap();
        assert_eq!(outcome, Outcome::default());
        assert_eq!(session.status(), ConnectionStatus::Connecting);
        assert!(session.credentials().verify("abcd", "1234"));
    }

    #[test]
    fn admitted_receiver_logout_disconnects() {
        let mut session = ShareSession::new();
        let mut provider = provider_with_session(&mut session);
        session.dispatch(&mut provider, Action::StartSharing).unwrap();
        let mut view = receiver(&mut session);
        session
            .dispatch(&mut view, Action::ConnectReceiver(Credentials::new("abcd", "1234")))
            .unwrap();

        let outcome = session.dispatch(&mut view, Action::Logout).unwrap();
        assert_eq!(outcome.terminated, Some(TerminationReason::UserStopped));
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
        assert!(session.credentials().verify("abcd", "1234"));
    }

    fn admitted_receiver(session: &mut ShareSession) -> ViewState {
        let mut view = receiver(session);
        session
            .dispatch(&mut view, Action::ConnectReceiver(Credentials::new("abcd", "1234")))
            .unwrap();
        view
    }

    #[test]
    fn receiver_from_an_ended_link_cannot_stop_the_next_session() {
        let mut session = ShareSession::new();
        let mut provider = provider_with_session(&mut session);
        session.dispatch(&mut provider, Action::StartSharing).unwrap();
        let mut old_receiver = admitted_receiver(&mut session);

        let outcome = session.tick_with(1e9).unwrap();
        assert_eq!(outcome, TickOutcome::Terminated(TerminationReason::DataCapReached));
        session.dispatch(&mut provider, Action::StartSharing).unwrap();
        assert_eq!(session.status(), ConnectionStatus::Connecting);

        assert_eq!(
            session.dispatch(&mut old_receiver, Action::StopSharing),
            Err(SessionError::NotConnected)
        );
        let outcome = session.dispatch(&mut old_receiver, Action::Logout).unwrap();
        assert_eq!(outcome, Outcome::default());
        assert_eq!(session.status(), ConnectionStatus::Connecting);
    }

    #[test]
    fn old_receiver_leaving_keeps_a_newer_receivers_link() {
        let mut session = ShareSession::new();
        let mut provider = provider_with_session(&mut session);
        session.dispatch(&mut provider, Action::StartSharing).unwrap();
        let mut old_receiver = admitted_receiver(&mut session);
        session.dispatch(&mut provider, Action::StopSharing).unwrap();

        session.dispatch(&mut provider, Action::StartSharing).unwrap();
        let new_receiver = admitted_receiver(&mut session);
        assert!(session.holds_link(&new_receiver));
        assert!(!session.holds_link(&old_receiver));

        session.dispatch(&mut old_receiver, Action::Logout).unwrap();
        assert_eq!(session.status(), ConnectionStatus::Connected);
        assert!(session.holds_link(&new_receiver));
    }

    #[test]
    fn stop_requires_provider_or_live_receiver() {
        let mut session = ShareSession::new();
        let mut provider = provider_with_session(&mut session);
        session.dispatch(&mut provider, Action::StartSharing).unwrap();

        assert_eq!(
            session.dispatch(&mut ViewState::new(), Action::StopSharing),
            Err(SessionError::NotPermitted)
        );
        let mut waiting = receiver(&mut session);
        assert_eq!(
            session.dispatch(&mut waiting, Action::StopSharing),
            Err(SessionError::NotConnected)
        );
        assert_eq!(session.status(), ConnectionStatus::Connecting);

        let mut live = admitted_receiver(&mut session);
        let outcome = session.dispatch(&mut live, Action::StopSharing).unwrap();
        assert_eq!(outcome.terminated, Some(TerminationReason::UserStopped));
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn second_provider_cannot_replace_credentials_mid_session() {
        let mut session = ShareSession::new();
        let mut provider = provider_with_session(&mut session);
        session.dispatch(&mut provider, Action::StartSharing).unwrap();

        let mut intruder = ViewState::new();
        session.dispatch(&mut intruder, Action::SelectRole(Role::Provider)).unwrap();
        assert_eq!(
            session.dispatch(&mut intruder, Action::CreateCredentials(Credentials::new("wxyz", "9876"))),
            Err(SessionError::AlreadySharing)
        );
        assert!(session.credentials().verify("abcd", "1234"));
        assert_eq!(intruder.view(), ViewTag::CredentialsSetup);

        assert_eq!(
            session.dispatch(&mut intruder, Action::StopSharing),
            Err(SessionError::NotPermitted)
        );
        let outcome = session.dispatch(&mut intruder, Action::Logout).unwrap();
        assert_eq!(outcome, Outcome::default());
        assert_eq!(session.status(), ConnectionStatus::Connecting);
        assert!(session.credentials().verify("abcd", "1234"));
    }
}
