use serde::{Deserialize, Serialize};

/// Configuration for the courses module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoursesConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    /// Base URL of the mail gateway; notifications are off when unset.
    #[serde(default)]
    pub mail_gateway_url: Option<String>,
    #[serde(default = "default_mail_from")]
    pub mail_from: String,
    #[serde(default = "default_mail_timeout_secs")]
    pub mail_timeout_secs: u64,
}

impl Default for CoursesConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            mail_gateway_url: None,
            mail_from: default_mail_from(),
            mail_timeout_secs: default_mail_timeout_secs(),
        }
    }
}

fn default_page_size() -> u64 {
    10
}

fn default_max_page_size() -> u64 {
    100
}

fn default_mail_from() -> String {
    "noreply@coursehub.local".to_string()
}

fn default_mail_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_catalog_paging() {
        let cfg: CoursesConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg.default_page_size, 10);
        assert_eq!(cfg.max_page_size, 100);
        assert!(cfg.mail_gateway_url.is_none());
    }

    #[test]
    fn gateway_url_is_read() {
        let cfg: CoursesConfig = serde_json::from_value(serde_json::json!({
            "mail_gateway_url": "http://mail.local:8025",
            "mail_from": "courses@example.com"
        }))
        .unwrap();
        assert_eq!(cfg.mail_gateway_url.as_deref(), Some("http://mail.local:8025"));
        assert_eq!(cfg.mail_from, "courses@example.com");
    }
}
