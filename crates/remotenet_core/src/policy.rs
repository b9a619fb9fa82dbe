//! crates/remotenet_core/src/policy.rs
//!
//! The provider-configured usage limits.

use crate::error::PolicyError;

pub const MB_PER_GB: f64 = 1024.0;
pub const MINUTES_PER_HOUR: f64 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct UsagePolicy {
    pub data_cap_gb: f64,
    pub duration_hours: f64,
    /// Newline-delimited site list. Stored for display, never enforced.
    pub allowed_sites: String,
}

impl Default for UsagePolicy {
    fn default() -> Self {
        Self {
            data_cap_gb: 5.0,
            duration_hours: 2.0,
            allowed_sites: String::new(),
        }
    }
}

impl UsagePolicy {
    /// Plain setter. Zero or negative values are accepted here so a
    /// half-edited form can be stored; `validate_for_start` rejects them.
    pub fn configure(&mut self, data_cap_gb: f64, duration_hours: f64, allowed_sites: String) {
        self.data_cap_gb = data_cap_gb;
        self.duration_hours = duration_hours;
        self.allowed_sites = allowed_sites;
    }

    pub fn validate_for_start(&self) -> Result<(), PolicyError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if positive(self.data_cap_gb) && positive(self.duration_hours) {
            Ok(())
        } else {
            Err(PolicyError::InvalidLimits)
        }
    }

    pub fn data_cap_mb(&self) -> f64 {
        self.data_cap_gb * MB_PER_GB
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_hours * MINUTES_PER_HOUR
    }

    /// Share of the data cap consumed, in percent; 0 while the cap is unset.
    pub fn data_used_percent(&self, used_mb: f64) -> f64 {
        percent(used_mb, self.data_cap_mb())
    }

    /// Share of the duration consumed, in percent; 0 while the duration is unset.
    pub fn time_used_percent(&self, elapsed_minutes: u32) -> f64 {
        percent(f64::from(elapsed_minutes), self.duration_minutes())
    }

    pub fn allowed_sites_list(&self) -> Vec<&str> {
        self.allowed_sites
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }
}

fn percent(used: f64, limit: f64) -> f64 {
    if limit > 0.0 {
        used / limit * 100.0
    } else {
        0.0
    }
}
