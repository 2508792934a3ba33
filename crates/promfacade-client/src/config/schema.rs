use std::time::Duration;

use serde::Deserialize;
use promfacade_core::error::{PromFacadeError, Result};

/// Backend call timeout used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub prometheus: PrometheusSection,

    #[serde(default)]
    pub batch: BatchSection,

    #[serde(default)]
    pub log: LogSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            prometheus: PrometheusSection::default(),
            batch: BatchSection::default(),
            log: LogSection::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PromFacadeError::UnsupportedVersion);
        }

        self.prometheus.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PrometheusSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl PrometheusSection {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(PromFacadeError::BadRequest(
                "prometheus.host must not be empty".into(),
            ));
        }
        if self.port == 0 {
            return Err(PromFacadeError::BadRequest(
                "prometheus.port must not be 0".into(),
            ));
        }
        if !(100..=300_000).contains(&self.timeout_ms) {
            return Err(PromFacadeError::BadRequest(
                "prometheus.timeout_ms must be between 100 and 300000".into(),
            ));
        }
        Ok(())
    }

    /// Base URL of the HTTP API. A host that already carries a scheme is
    /// used as-is apart from the port.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}:{}", self.port)
        } else {
            format!("http://{host}:{}", self.port)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    9090
}
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Fan-out bound for batch queries. `0` means one task per expression
/// with no cap.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchSection {
    #[serde(default)]
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    /// Fallback filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}
