use std::env;
use std::time::Duration;

use crate::application::drag::DragConfig;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    /// Origin used for share links (`{public_base_url}/{id}?token=`).
    pub public_base_url: String,
    pub session_file: String,
    pub press_delay_ms: u64,
    pub long_press_ms: u64,
    pub move_threshold_px: f64,
    pub request_timeout_secs: u64,
    pub is_production: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_url = lookup("VAULT_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "http://localhost:3000/api".into());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            anyhow::bail!("VAULT_API_URL must be an absolute http(s) URL, got '{api_url}'");
        }
        let public_base_url = lookup("PUBLIC_BASE_URL")
            .and_then(|v| {
                let trimmed = v.trim();
                if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
                    Some(trimmed.trim_end_matches('/').to_string())
                } else {
                    None
                }
            })
            .unwrap_or_else(|| origin_of(&api_url));
        let session_file =
            lookup("VAULT_SESSION_FILE").unwrap_or_else(|| "./.vault-session".into());
        let press_delay_ms = lookup("PRESS_DELAY_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(200);
        let long_press_ms = lookup("LONG_PRESS_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(500);
        let move_threshold_px = lookup("MOVE_THRESHOLD_PX")
            .and_then(|s| s.parse().ok())
            .filter(|v: &f64| v.is_finite() && *v >= 0.0)
            .unwrap_or(4.0);
        let request_timeout_secs = lookup("REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        let is_production = matches!(
            lookup("RUST_ENV").as_deref(),
            Some("production") | Some("prod")
        );

        // Credentials travel as bearer headers: never over plain http in production.
        if is_production && !api_url.starts_with("https://") {
            anyhow::bail!("VAULT_API_URL must use https in production");
        }
        if long_press_ms <= press_delay_ms {
            anyhow::bail!("LONG_PRESS_MS must be greater than PRESS_DELAY_MS");
        }

        Ok(Self {
            api_url,
            public_base_url,
            session_file,
            press_delay_ms,
            long_press_ms,
            move_threshold_px,
            request_timeout_secs,
            is_production,
        })
    }

    pub fn drag(&self) -> DragConfig {
        DragConfig {
            press_delay: Duration::from_millis(self.press_delay_ms),
            long_press: Duration::from_millis(self.long_press_ms),
            move_threshold: self.move_threshold_px,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `https://host:port/api` -> `https://host:port`
fn origin_of(url: &str) -> String {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[scheme_end..].find('/') {
        Some(slash) => url[..scheme_end + slash].to_string(),
        None => url.to_string(),
    }
}
