//! crates/remotenet_core/src/credentials.rs
//!
//! Holds the single credential pair issued for the active session.

use crate::{domain::Credentials, error::CredentialError};
use tracing::debug;

/// Minimum length, in characters, of both the identifier and the secret.
pub const MIN_CREDENTIAL_LEN: usize = 4;

#[derive(Debug, Default)]
pub struct CredentialStore {
    issued: Option<Credentials>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new pair, replacing any previously issued one.
    pub fn issue(&mut self, identifier: &str, secret: &str) -> Result<Credentials, CredentialError> {
        if identifier.chars().count() < MIN_CREDENTIAL_LEN
            || secret.chars().count() < MIN_CREDENTIAL_LEN
        {
            return Err(CredentialError::TooShort {
                min: MIN_CREDENTIAL_LEN,
            });
        }

        let credentials = Credentials::new(identifier, secret);
        self.issued = Some(credentials.clone());
        debug!("Issued credentials for identifier '{}'", identifier);
        Ok(credentials)
    }

    /// Exact, byte-for-byte comparison against the issued pair.
    /// Returns false if nothing has been issued yet.
    pub fn verify(&self, identifier: &str, secret: &str) -> bool {
        self.issued
            .as_ref()
            .is_some_and(|c| c.identifier == identifier && c.secret == secret)
    }

    pub fn issued(&self) -> Option<&Credentials> {
        self.issued.as_ref()
    }

    pub fn clear(&mut self) {
        self.issued = None;
    }
}
