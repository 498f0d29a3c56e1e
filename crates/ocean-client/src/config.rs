//! Client configuration.

use crate::error::{ClientError, ClientResult};
use alloy::primitives::Address;
use ocean_api::ApiConfig;
use ocean_core::validate_address;
use ocean_trade::KeySource;
use ocean_ws::StreamConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level configuration, usually loaded from `config/default.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    /// Without credentials only market data and streams are available.
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    /// Without a signer orders cannot be placed.
    #[serde(default)]
    pub signer: Option<SignerConfig>,
}

/// Relayer credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AuthConfig {
    /// API key pair. The secret is given inline or read from `secret_env`.
    ApiKey {
        key: String,
        #[serde(default)]
        secret: Option<String>,
        #[serde(default)]
        secret_env: Option<String>,
    },
    /// Session tokens obtained elsewhere.
    Session {
        username: String,
        id_token: String,
        #[serde(default)]
        refresh_token: Option<String>,
    },
}

impl AuthConfig {
    /// API secret for `ApiKey` mode. The inline value wins over `secret_env`.
    pub fn api_secret(&self) -> ClientResult<Option<String>> {
        let Self::ApiKey {
            secret, secret_env, ..
        } = self
        else {
            return Ok(None);
        };
        if let Some(secret) = secret {
            return Ok(Some(secret.clone()));
        }
        match secret_env {
            Some(var) => std::env::var(var)
                .map(Some)
                .map_err(|_| ClientError::Config(format!("API secret env var not set: {var}"))),
            None => Err(ClientError::Config(
                "auth.api_key needs `secret` or `secret_env`".to_string(),
            )),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey {
                key, secret_env, ..
            } => f
                .debug_struct("ApiKey")
                .field("key", key)
                .field("secret_env", secret_env)
                .finish_non_exhaustive(),
            Self::Session { username, .. } => f
                .debug_struct("Session")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Maker key settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerConfig {
    pub source: KeySource,
    /// Refuse to start unless the key derives this address.
    #[serde(default)]
    pub expected_address: Option<String>,
}

impl SignerConfig {
    pub fn expected_address(&self) -> ClientResult<Option<Address>> {
        self.expected_address
            .as_deref()
            .map(|s| {
                validate_address(s)
                    .map_err(|e| ClientError::Config(e.to_string()))?
                    .parse::<Address>()
                    .map_err(|e| ClientError::Config(format!("Invalid expected_address: {e}")))
            })
            .transpose()
    }
}

impl ClientConfig {
    /// Load configuration from file.
    pub fn from_file(path: &str) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ClientResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ClientError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ClientResult<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "api.base_url must be http(s): {}",
                self.api.base_url
            )));
        }
        if !self.stream.url.starts_with("ws://") && !self.stream.url.starts_with("wss://") {
            return Err(ClientError::Config(format!(
                "stream.url must be ws(s): {}",
                self.stream.url
            )));
        }
        match &self.auth {
            Some(AuthConfig::ApiKey { key, .. }) if key.is_empty() => {
                return Err(ClientError::Config("auth.key is empty".to_string()));
            }
            Some(AuthConfig::Session { id_token, .. }) if id_token.is_empty() => {
                return Err(ClientError::Config("auth.id_token is empty".to_string()));
            }
            _ => {}
        }
        if let Some(signer) = &self.signer {
            signer.expected_address()?;
        }
        Ok(())
    }
}
