//! Application configuration parsed from environment variables.

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: &'static str },

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Project base URL, without a trailing slash.
    pub supabase_url: String,
    /// Public (anon) API key sent as the `apikey` header.
    pub anon_key: String,
    pub timeouts: HttpTimeouts,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("supabase_url", &self.supabase_url)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `SUPABASE_URL`: `http://` or `https://` project URL
    /// - `SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `AUTH_REQUEST_TIMEOUT_SECS`: default 30
    /// - `AUTH_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = std::env::var("SUPABASE_URL").map_err(|_| ConfigError::Missing { var: "SUPABASE_URL" })?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY").map_err(|_| ConfigError::Missing { var: "SUPABASE_ANON_KEY" })?;
        let timeouts = HttpTimeouts {
            request_secs: env_parse_u64("AUTH_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("AUTH_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Self::new(&supabase_url, &anon_key, timeouts)
    }

    /// Validate and normalize explicit values.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not http(s) or the key is blank.
    pub fn new(supabase_url: &str, anon_key: &str, timeouts: HttpTimeouts) -> Result<Self, ConfigError> {
        let supabase_url = parse_base_url(supabase_url)?;
        let anon_key = anon_key.trim();
        if anon_key.is_empty() {
            return Err(ConfigError::Invalid { var: "SUPABASE_ANON_KEY", reason: "empty".into() });
        }
        Ok(Self { supabase_url, anon_key: anon_key.to_owned(), timeouts })
    }
}

fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        return Err(ConfigError::Invalid { var: "SUPABASE_URL", reason: format!("expected http(s) URL, got '{raw}'") });
    }
    Ok(trimmed.to_owned())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
