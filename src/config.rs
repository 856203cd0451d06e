use std::fs;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use serde_derive::Deserialize;
use serde_json::from_str;

use crate::backend::{Backend, HttpBackend};
use crate::error::ConfigError;
use crate::pool::Pool;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: usize = 256 * 1024;

#[derive(Debug, Deserialize)]
pub struct Configs {
    pub load_balancer: ListenConfig,
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
    /// Per-request upstream timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Largest inbound body buffered for forwarding.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub address: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_weight() -> u32 {
    1
}

impl Configs {
    pub fn load(path: &str) -> Result<Configs, ConfigError> {
        let input = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Configs::parse(&input, path)
    }

    /// `origin` only labels errors.
    pub fn parse(input: &str, origin: &str) -> Result<Configs, ConfigError> {
        from_str(input).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Duration::from_secs(self.timeout_secs))
    }

    /// Builds every backend up front, the first bad entry fails the whole pool.
    pub fn build_pool(&self) -> Result<Pool, ConfigError> {
        let timeout = self.timeout()?;
        let backends = self
            .servers
            .iter()
            .map(|server| {
                HttpBackend::new(&server.address, server.weight)
                    .map(|backend| Arc::new(backend.with_timeout(timeout)) as Arc<dyn Backend>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        if backends.is_empty() {
            warn!("no backends configured, every request will fail");
        }
        Ok(Pool::new(backends))
    }
}
