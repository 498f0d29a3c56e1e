//! Client bootstrap.

use crate::config::{AuthConfig, ClientConfig, SignerConfig};
use crate::error::{ClientError, ClientResult};
use ocean_api::{AuthContext, Credentials, RestClient, SessionTokens};
use ocean_trade::{KeyManager, LocalOrderSigner, OrderWorkflow, RestTradeApi};
use ocean_ws::StreamTransport;
use std::sync::Arc;
use tracing::{info, warn};

/// Order workflow backed by the REST API and a local key.
pub type Workflow = OrderWorkflow<RestTradeApi, LocalOrderSigner>;

/// REST client, order workflow and stream transport built from one config.
pub struct OceanClient {
    rest: Arc<RestClient>,
    workflow: Option<Workflow>,
    stream: StreamTransport,
}

impl OceanClient {
    /// Build every component and authenticate when credentials are configured.
    pub async fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let rest = Arc::new(build_rest_client(&config).await?);
        let workflow = match &config.signer {
            Some(signer) => Some(build_workflow(Arc::clone(&rest), signer)?),
            None => {
                info!("No signer configured, order placement disabled");
                None
            }
        };
        let stream = StreamTransport::new(config.stream.clone());

        Ok(Self {
            rest,
            workflow,
            stream,
        })
    }

    pub fn rest(&self) -> &Arc<RestClient> {
        &self.rest
    }

    /// The order workflow. Needs both credentials and a signer.
    pub fn trade(&self) -> ClientResult<&Workflow> {
        if !self.rest.is_authenticated() {
            return Err(ClientError::NotConfigured(
                "trading requires credentials".to_string(),
            ));
        }
        self.workflow
            .as_ref()
            .ok_or_else(|| ClientError::NotConfigured("trading requires a signer".to_string()))
    }

    pub fn stream(&self) -> &StreamTransport {
        &self.stream
    }

    /// Connect the stream, authenticating with the session token when held.
    pub async fn connect_stream(&self) -> ClientResult<()> {
        let token = self.rest.session_token();
        self.stream.connect(token.as_deref()).await?;
        Ok(())
    }

    /// Unsubscribe everything and close the stream.
    pub async fn shutdown(&self) {
        if self.stream.is_connected() {
            match self.stream.unsubscribe_all() {
                Ok(count) => info!(count, "Unsubscribed"),
                Err(e) => warn!(error = %e, "Unsubscribe on shutdown failed"),
            }
        }
        self.stream.disconnect().await;
    }
}

async fn build_rest_client(config: &ClientConfig) -> ClientResult<RestClient> {
    match &config.auth {
        None => {
            warn!("No credentials configured, trading calls unavailable");
            Ok(RestClient::new(config.api.clone())?)
        }
        Some(auth @ AuthConfig::ApiKey { key, .. }) => {
            let secret = auth
                .api_secret()?
                .ok_or_else(|| ClientError::Config("API secret missing".to_string()))?;
            let client = RestClient::new(config.api.clone())?;
            client.set_api_key(key.clone(), secret).await?;
            Ok(client)
        }
        Some(AuthConfig::Session {
            username,
            id_token,
            refresh_token,
        }) => {
            let auth = AuthContext::new(
                Some(Credentials::Session {
                    username: username.clone(),
                }),
                Some(SessionTokens::new(id_token.clone(), refresh_token.clone())),
            );
            info!(username = %username, "Using session credentials");
            Ok(RestClient::with_auth(config.api.clone(), auth)?)
        }
    }
}

fn build_workflow(rest: Arc<RestClient>, signer: &SignerConfig) -> ClientResult<Workflow> {
    let key_manager = KeyManager::load(&signer.source, signer.expected_address()?)?;
    let local = LocalOrderSigner::new(Arc::new(key_manager));
    info!(address = %local.address(), "Order signer ready");
    Ok(OrderWorkflow::new(RestTradeApi::new(rest), local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use ocean_trade::KeySource;
    use serde_json::json;

    const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn config_for(server: &MockServer) -> ClientConfig {
        let mut config = ClientConfig::default();
        config.api.base_url = server.base_url();
        config
    }

    #[tokio::test]
    async fn test_without_credentials() {
        let server = MockServer::start_async().await;
        let client = OceanClient::new(config_for(&server)).await.unwrap();

        assert!(!client.rest().is_authenticated());
        assert!(matches!(client.trade(), Err(ClientError::NotConfigured(_))));
        assert!(!client.stream().is_connected());
    }

    #[tokio::test]
    async fn test_api_key_bootstrap_with_signer() {
        let server = MockServer::start_async().await;
        let token = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/token")
                    .json_body(json!({ "apiKey": "key-1", "secret": "shh" }));
                then.status(200).json_body(json!({
                    "idToken": { "jwtToken": "id-1" },
                    "refreshToken": { "token": "refresh-1" }
                }));
            })
            .await;

        let var = "OCEAN_CLIENT_BOOTSTRAP_KEY_91C2";
        std::env::set_var(var, TEST_PRIVATE_KEY);

        let mut config = config_for(&server);
        config.auth = Some(AuthConfig::ApiKey {
            key: "key-1".to_string(),
            secret: Some("shh".to_string()),
            secret_env: None,
        });
        config.signer = Some(SignerConfig {
            source: KeySource::EnvVar {
                var_name: var.to_string(),
            },
            expected_address: Some(TEST_ADDRESS.to_string()),
        });

        let client = OceanClient::new(config).await.unwrap();
        std::env::remove_var(var);

        token.assert_calls_async(1).await;
        assert!(client.rest().is_authenticated());
        assert_eq!(client.rest().session_token().as_deref(), Some("id-1"));
        assert!(client.trade().is_ok());
    }

    #[tokio::test]
    async fn test_session_credentials_without_signer() {
        let server = MockServer::start_async().await;
        let mut config = config_for(&server);
        config.auth = Some(AuthConfig::Session {
            username: "alice".to_string(),
            id_token: "id-tok".to_string(),
            refresh_token: Some("refresh".to_string()),
        });

        let client = OceanClient::new(config).await.unwrap();
        assert!(client.rest().is_authenticated());
        assert!(matches!(client.trade(), Err(ClientError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_rejected_api_key_fails_bootstrap() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/token");
                then.status(401).body("bad key");
            })
            .await;

        let mut config = config_for(&server);
        config.auth = Some(AuthConfig::ApiKey {
            key: "key-1".to_string(),
            secret: Some("wrong".to_string()),
            secret_env: None,
        });

        let err = OceanClient::new(config).await.err().unwrap();
        assert!(matches!(err, ClientError::Api(ref e) if e.is_auth_expired()));
    }

    #[tokio::test]
    async fn test_signer_address_mismatch() {
        let server = MockServer::start_async().await;
        let var = "OCEAN_CLIENT_MISMATCH_KEY_5D10";
        std::env::set_var(var, TEST_PRIVATE_KEY);

        let mut config = config_for(&server);
        config.signer = Some(SignerConfig {
            source: KeySource::EnvVar {
                var_name: var.to_string(),
            },
            expected_address: Some("0x0000000000000000000000000000000000000001".to_string()),
        });

        let result = OceanClient::new(config).await;
        std::env::remove_var(var);
        assert!(matches!(result, Err(ClientError::Key(_))));
    }
}
