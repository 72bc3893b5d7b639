// Runtime configuration for the echoes client.
// Reads the API location, optional credentials, and timeouts from the environment.

use std::time::Duration;

use url::Url;

use crate::error::{EchoesError, Result};

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 90;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Login credentials used to open a session at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the story backend.
    pub api_url: Url,
    pub credentials: Option<Credentials>,
    /// Upper bound for a single story generation request.
    pub generation_timeout: Duration,
    /// Timeout applied by the HTTP client to every other request.
    pub request_timeout: Duration,
}

impl Config {
    /// Build configuration from `ECHOES_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw_url = lookup("ECHOES_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(&raw_url)
            .map_err(|e| EchoesError::Config(format!("ECHOES_API_URL {:?}: {}", raw_url, e)))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(EchoesError::Config(format!(
                "ECHOES_API_URL must be http or https, got {}",
                api_url.scheme()
            )));
        }

        let credentials = match (lookup("ECHOES_USERNAME"), lookup("ECHOES_PASSWORD")) {
            (Some(username), Some(password)) if !username.trim().is_empty() => Some(Credentials {
                username: username.trim().to_string(),
                password,
            }),
            _ => None,
        };

        let generation_timeout = secs_var(
            &lookup,
            "ECHOES_GENERATION_TIMEOUT_SECS",
            DEFAULT_GENERATION_TIMEOUT_SECS,
        )?;
        let request_timeout = secs_var(
            &lookup,
            "ECHOES_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Self {
            api_url,
            credentials,
            generation_timeout,
            request_timeout,
        })
    }
}

fn secs_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration> {
    match lookup(key) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| EchoesError::Config(format!("{} must be whole seconds", key)))?;
            if secs == 0 {
                return Err(EchoesError::Config(format!("{} must be positive", key)));
            }
            Ok(Duration::from_secs(secs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_url.as_str(), "http://127.0.0.1:5000/");
        assert!(config.credentials.is_none());
        assert_eq!(config.generation_timeout, Duration::from_secs(90));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("ECHOES_API_URL", "https://echoes.example.com"),
            ("ECHOES_USERNAME", " ruby "),
            ("ECHOES_PASSWORD", "charleston1920"),
            ("ECHOES_GENERATION_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.api_url.host_str(), Some("echoes.example.com"));
        assert_eq!(
            config.credentials,
            Some(Credentials {
                username: "ruby".to_string(),
                password: "charleston1920".to_string(),
            })
        );
        assert_eq!(config.generation_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_username_without_password_is_ignored() {
        let config = Config::from_lookup(lookup_from(&[("ECHOES_USERNAME", "ruby")])).unwrap();
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_lookup(lookup_from(&[("ECHOES_API_URL", "not a url")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("ECHOES_API_URL", "ftp://host")])).is_err());
        assert!(
            Config::from_lookup(lookup_from(&[("ECHOES_REQUEST_TIMEOUT_SECS", "0")])).is_err()
        );
        assert!(
            Config::from_lookup(lookup_from(&[("ECHOES_GENERATION_TIMEOUT_SECS", "soon")]))
                .is_err()
        );
    }
}
