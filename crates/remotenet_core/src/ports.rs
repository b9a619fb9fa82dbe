//! crates/remotenet_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like LLM providers.

use async_trait::async_trait;
use tracing::error;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, LLM).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Service not configured: {0}")]
    NotConfigured(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

pub const ADVISORY_UNCONFIGURED: &str = "API Key not configured. Could not analyze speed.";
pub const ADVISORY_UNAVAILABLE: &str =
    "Could not analyze speed at this time. Please try again later.";

#[async_trait]
pub trait SpeedAdvisoryService: Send + Sync {
    /// Produces a one-sentence, user-friendly summary of what a connection with
    /// the given speeds is good for.
    async fn analyze_speed(&self, download_mbps: f64, upload_mbps: f64) -> PortResult<String>;
}

/// Asks the advisory service for a summary, substituting a fixed fallback
/// when the service is missing or fails. Never returns an error.
pub async fn advise(
    service: Option<&dyn SpeedAdvisoryService>,
    download_mbps: f64,
    upload_mbps: f64,
) -> String {
    let Some(service) = service else {
        return ADVISORY_UNCONFIGURED.to_string();
    };

    match service.analyze_speed(download_mbps, upload_mbps).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            error!("Advisory service returned an empty response.");
            ADVISORY_UNAVAILABLE.to_string()
        }
        Err(PortError::NotConfigured(reason)) => {
            error!("Advisory service is not configured: {}", reason);
            ADVISORY_UNCONFIGURED.to_string()
        }
        Err(e) => {
            error!("Error analyzing speed: {}", e);
            ADVISORY_UNAVAILABLE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    struct Fixed(PortResult<&'static str>);

    #[async_trait]
    impl SpeedAdvisoryService for Fixed {
        async fn analyze_speed(&self, _: f64, _: f64) -> PortResult<String> {
            match &self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(PortError::NotConfigured(m)) => Err(PortError::NotConfigured(m.clone())),
                Err(PortError::Unexpected(m)) => Err(PortError::Unexpected(m.clone())),
            }
        }
    }

    #[test]
    fn missing_service_yields_unconfigured_fallback() {
        assert_eq!(block_on(advise(None, 40.0, 10.0)), ADVISORY_UNCONFIGURED);
    }

    #[test]
    fn failing_service_yields_unavailable_fallback() {
        let service = Fixed(Err(PortError::Unexpected("boom".into())));
        assert_eq!(
            block_on(advise(Some(&service), 40.0, 10.0)),
            ADVISORY_UNAVAILABLE
        );
    }

    #[test]
    fn successful_text_is_trimmed() {
        let service = Fixed(Ok("  Great for HD streaming.\n"));
        assert_eq!(
            block_on(advise(Some(&service), 40.0, 10.0)),
            "Great for HD streaming."
        );
    }
}
