use serde::{Deserialize, Serialize};

/// Configuration for the accounts module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountsConfig {
    /// Period of the stale-account sweep.
    #[serde(default = "default_stale_check_interval_secs")]
    pub stale_check_interval_secs: u64,
    /// Accounts whose last login is older than this are deactivated.
    #[serde(default = "default_inactivity_days")]
    pub inactivity_days: u32,
    /// Set to false to run without the background sweep.
    #[serde(default = "default_stale_job_enabled")]
    pub stale_job_enabled: bool,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            stale_check_interval_secs: default_stale_check_interval_secs(),
            inactivity_days: default_inactivity_days(),
            stale_job_enabled: default_stale_job_enabled(),
        }
    }
}

fn default_stale_check_interval_secs() -> u64 {
    24 * 60 * 60
}

fn default_inactivity_days() -> u32 {
    30
}

fn default_stale_job_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_uses_defaults() {
        let cfg: AccountsConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg.stale_check_interval_secs, 86_400);
        assert_eq!(cfg.inactivity_days, 30);
        assert!(cfg.stale_job_enabled);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res: Result<AccountsConfig, _> =
            serde_json::from_value(serde_json::json!({ "inactivity": 3 }));
        assert!(res.is_err());
    }
}
