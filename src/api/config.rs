use std::env;
use log::warn;

const BIND_VAR: &str = "SKYFOREST_BIND";
const BODY_LIMIT_VAR: &str = "SKYFOREST_BODY_LIMIT_MB";

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_BODY_LIMIT_MB: usize = 100;

/// Settings for the HTTP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: String,
    /// Largest accepted request body in bytes
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            body_limit: DEFAULT_BODY_LIMIT_MB * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Reads `SKYFOREST_BIND` and `SKYFOREST_BODY_LIMIT_MB`
    pub fn from_env() -> Self {
        Self::from_values(env::var(BIND_VAR).ok(), env::var(BODY_LIMIT_VAR).ok())
    }

    fn from_values(bind: Option<String>, body_limit_mb: Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(bind) = bind.filter(|b| !b.trim().is_empty()) {
            config.bind = bind.trim().to_string();
        }

        if let Some(raw) = body_limit_mb {
            match raw.trim().parse::<usize>().ok().and_then(|mb| mb.checked_mul(1024 * 1024)) {
                Some(limit) if limit > 0 => config.body_limit = limit,
                _ => warn!(
                    "ignoring {}={:?}, using {} MB", BODY_LIMIT_VAR, raw, DEFAULT_BODY_LIMIT_MB
                ),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_values(None, None);
        assert_eq!(config.bind, "0.0.0.0:3000");
        assert_eq!(config.body_limit, 100 * 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_values(Some("127.0.0.1:8080".into()), Some("5".into()));
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.body_limit, 5 * 1024 * 1024);
    }

    #[test]
    fn test_bad_limit_falls_back() {
        let config = ServerConfig::from_values(None, Some("lots".into()));
        assert_eq!(config.body_limit, ServerConfig::default().body_limit);

        let config = ServerConfig::from_values(Some("  ".into()), Some("0".into()));
        assert_eq!(config, ServerConfig::default());
    }
}
