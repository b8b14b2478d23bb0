//! Server configuration
//!
//! Settings come from environment variables, with CLI flags layered on top by
//! the binary. Every value has a default so the service starts with no
//! environment at all.
//!
//! - `LINKCARD_HOST`: bind host (default: 127.0.0.1)
//! - `LINKCARD_PORT`: bind port (default: 3001)
//! - `LINKCARD_FETCH_TIMEOUT_MS`: outbound fetch timeout (default: 5000)
//! - `LINKCARD_MAX_BODY_BYTES`: cap on bytes read from the target (default: 1 MiB)
//! - `LINKCARD_USER_AGENT`: crawler user agent
//! - `LINKCARD_ALLOWED_ORIGINS`: comma-separated site origins for CORS

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tracing::{info, warn};

use crate::error::ConfigError;

/// Default bind host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port
pub const DEFAULT_PORT: u16 = 3001;

/// Default outbound fetch timeout in milliseconds
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5000;

/// Default cap on bytes read from the target document
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default user agent sent with every outbound fetch
pub const DEFAULT_USER_AGENT: &str = concat!(
    "linkcard-web/",
    env!("CARGO_PKG_VERSION"),
    " (+link preview crawler)"
);

/// Settings for the outbound fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Timeout for the whole request, including reading the body
    pub timeout_ms: u64,
    /// Bytes beyond this are discarded before parsing
    pub max_body_bytes: usize,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    /// Timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Set the fetch timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the body cap.
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Complete server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind
    pub host: IpAddr,
    /// Port to bind
    pub port: u16,
    /// Outbound fetch settings
    pub fetch: FetchConfig,
    /// Site origins allowed by CORS in addition to localhost
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
            fetch: FetchConfig::default(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unparseable or
    /// out-of-range value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("LINKCARD_HOST") {
            config.host = parse_host(&host)?;
        }

        if let Some(port) = lookup("LINKCARD_PORT") {
            config.port = parse_number("LINKCARD_PORT", &port)?;
        }

        if let Some(timeout) = lookup("LINKCARD_FETCH_TIMEOUT_MS") {
            config.fetch.timeout_ms = parse_number("LINKCARD_FETCH_TIMEOUT_MS", &timeout)?;
        }

        if let Some(max_body) = lookup("LINKCARD_MAX_BODY_BYTES") {
            config.fetch.max_body_bytes = parse_number("LINKCARD_MAX_BODY_BYTES", &max_body)?;
        }

        if let Some(user_agent) = lookup("LINKCARD_USER_AGENT") {
            let user_agent = user_agent.trim();
            if !user_agent.is_empty() {
                config.fetch.user_agent = user_agent.to_string();
            }
        }

        if let Some(origins) = lookup("LINKCARD_ALLOWED_ORIGINS") {
            config.allowed_origins = parse_origins(&origins);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check ranges that parsing alone does not catch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: "LINKCARD_FETCH_TIMEOUT_MS".to_string(),
                reason: "timeout cannot be 0".to_string(),
            });
        }

        if self.fetch.max_body_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                name: "LINKCARD_MAX_BODY_BYTES".to_string(),
                reason: "body cap cannot be 0".to_string(),
            });
        }

        if !self.host.is_loopback() {
            warn!("Binding to non-loopback address {}", self.host);
        }

        Ok(())
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Log the effective configuration.
    pub fn log_summary(&self) {
        info!(
            "Config: bind={} timeout={}ms max_body={}B origins={:?}",
            self.bind_addr(),
            self.fetch.timeout_ms,
            self.fetch.max_body_bytes,
            self.allowed_origins
        );
    }
}

/// Parse a bind host.
pub fn parse_host(value: &str) -> Result<IpAddr, ConfigError> {
    value
        .trim()
        .parse::<IpAddr>()
        .map_err(|_| ConfigError::InvalidBindAddress(value.to_string()))
}

fn parse_number<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

/// Split a comma-separated origin list, dropping blanks and trailing slashes.
pub fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_with_empty_env() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:3001");
        assert_eq!(config.fetch.timeout_ms, 5000);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("LINKCARD_HOST", "0.0.0.0"),
            ("LINKCARD_PORT", "8080"),
            ("LINKCARD_FETCH_TIMEOUT_MS", "2500"),
            ("LINKCARD_MAX_BODY_BYTES", "65536"),
            ("LINKCARD_USER_AGENT", "TestBot/1.0"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.fetch.timeout(), Duration::from_millis(2500));
        assert_eq!(config.fetch.max_body_bytes, 65536);
        assert_eq!(config.fetch.user_agent, "TestBot/1.0");
    }

    #[test]
    fn test_blank_user_agent_keeps_default() {
        let config =
            ServerConfig::from_lookup(lookup_from(&[("LINKCARD_USER_AGENT", "   ")])).unwrap();
        assert_eq!(config.fetch.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(lookup_from(&[("LINKCARD_PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "LINKCARD_PORT"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[("LINKCARD_FETCH_TIMEOUT_MS", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("timeout cannot be 0"));
    }

    #[test]
    fn test_zero_body_cap_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[("LINKCARD_MAX_BODY_BYTES", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("body cap cannot be 0"));
    }

    #[test]
    fn test_invalid_host() {
        let err = parse_host("localhost").unwrap_err();
        assert_eq!(err, ConfigError::InvalidBindAddress("localhost".to_string()));
    }

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins(" https://example.com/, ,https://www.example.com ");
        assert_eq!(
            origins,
            vec![
                "https://example.com".to_string(),
                "https://www.example.com".to_string()
            ]
        );
    }

    #[test]
    fn test_default_user_agent_identifies_crawler() {
        assert!(DEFAULT_USER_AGENT.starts_with("linkcard-web/"));
        assert!(DEFAULT_USER_AGENT.contains("crawler"));
    }
}
