use std::time::Duration;

use osbench_core::Config;

use super::{Error, Result};

/// Failed connects surface promptly instead of waiting out the OS-level TCP timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Swift v1 auth: exchanged for a token and a storage URL on login.
    Swift {
        auth_url: String,
        username: String,
        password: String,
    },
    /// Fixed storage URL, with an optional pre-issued token.
    Static {
        storage_url: String,
        token: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpStorageConfig {
    pub credentials: Credentials,
    /// Applies to the response head of every request.
    pub timeout: Option<Duration>,
    pub connect_timeout: Duration,
}

impl HttpStorageConfig {
    /// Reads `auth_url`/`username`/`password`, or `storage_url` with an optional `token`,
    /// plus `timeout` and `connect_timeout` in milliseconds.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = match config.get("auth_url") {
            Some(auth_url) => Credentials::Swift {
                auth_url: auth_url.to_string(),
                username: required(config, "username")?,
                password: required(config, "password")?,
            },
            None => Credentials::Static {
                storage_url: required(config, "storage_url")?,
                token: config.get("token").map(str::to_string),
            },
        };

        let timeout = config
            .get_parsed::<u64>("timeout")?
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);

        Ok(Self {
            credentials,
            timeout,
            connect_timeout: config.get_millis_or("connect_timeout", DEFAULT_CONNECT_TIMEOUT)?,
        })
    }
}

fn required(config: &Config, key: &'static str) -> Result<String> {
    config
        .get(key)
        .map(str::to_string)
        .ok_or(Error::MissingConfig(key))
}
