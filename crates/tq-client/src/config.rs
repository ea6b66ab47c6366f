//! # Config
//!
//! Where the backend lives and how to authenticate. Loaded from TOML,
//! then overridden from the environment:
//!
//! ```toml
//! host = "acme.backend.tempoiq.com"
//! port = 443          # default
//! scheme = "https"    # default
//! timeout_ms = 50000  # default
//!
//! [credentials]
//! key = "..."
//! secret = "..."
//! ```
//!
//! Environment: `TQ_HOST`, `TQ_PORT`, `TQ_SCHEME`, `TQ_KEY`, `TQ_SECRET`.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tq_core::{Error, Result};

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub credentials: Credentials,
}

fn default_port() -> u16 {
    443
}

fn default_scheme() -> String {
    "https".into()
}

fn default_timeout_ms() -> u64 {
    50_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            scheme: default_scheme(),
            timeout_ms: default_timeout_ms(),
            credentials: Credentials::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            host: host.into(),
            credentials,
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// File (when given and present), then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        base.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply `TQ_*` overrides found through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("TQ_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("TQ_PORT") {
            self.port = port
                .parse()
                .map_err(|_| Error::Config(format!("TQ_PORT is not a port: '{}'", port)))?;
        }
        if let Some(scheme) = lookup("TQ_SCHEME") {
            self.scheme = scheme;
        }
        if let Some(key) = lookup("TQ_KEY") {
            self.credentials.key = key;
        }
        if let Some(secret) = lookup("TQ_SECRET") {
            self.credentials.secret = secret;
        }
        Ok(self)
    }

    /// `<scheme>://<host>:<port>/`
    pub fn base_url(&self) -> Result<String> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("no host configured".into()));
        }
        Ok(format!("{}://{}:{}/", self.scheme, self.host, self.port))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = ClientConfig::from_toml_str(
            r#"
            host = "acme.backend.tempoiq.com"

            [credentials]
            key = "k"
            secret = "s"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 443);
        assert_eq!(config.scheme, "https");
        assert_eq!(config.timeout(), Duration::from_millis(50_000));
        assert_eq!(config.credentials, Credentials::new("k", "s"));
        assert_eq!(
            config.base_url().unwrap(),
            "https://acme.backend.tempoiq.com:443/"
        );
    }

    #[test]
    fn test_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("TQ_HOST", "localhost"),
            ("TQ_PORT", "8080"),
            ("TQ_SCHEME", "http"),
            ("TQ_SECRET", "from-env"),
        ]
        .into_iter()
        .collect();
        let config = ClientConfig::new("remote", Credentials::new("k", "s"))
            .with_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.base_url().unwrap(), "http://localhost:8080/");
        assert_eq!(config.credentials, Credentials::new("k", "from-env"));
    }

    #[test]
    fn test_bad_port_override() {
        let result = ClientConfig::default().with_overrides(|name| {
            (name == "TQ_PORT").then(|| "eighty".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_host_is_a_config_error() {
        assert!(matches!(
            ClientConfig::default().base_url(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            ClientConfig::from_toml_str("port = \"not a number\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_secret_is_not_printed() {
        let printed = format!("{:?}", Credentials::new("k", "hunter2"));
        assert!(!printed.contains("hunter2"));
    }
}
