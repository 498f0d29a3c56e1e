//! REST client with the authenticated request wrapper.
//!
//! Every call goes through [`RestClient::send`]. Authenticated calls go
//! through [`RestClient::auth_request`], which refreshes the session and
//! replays the same request when the relayer answers 401.

use parking_lot::RwLock;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Url};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::auth::{AuthContext, Credentials, SessionTokens};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Refreshes allowed after the initial attempt.
pub const DEFAULT_AUTH_RETRIES: u32 = 5;

/// One relayer request, replayable as-is after a token refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    /// Path relative to the configured base URL.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add the fields of `params` as query parameters. Null fields are skipped.
    pub fn with_query<T: Serialize>(mut self, params: &T) -> ApiResult<Self> {
        match serde_json::to_value(params)? {
            Value::Object(fields) => {
                for (name, value) in fields {
                    let value = match value {
                        Value::Null => continue,
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    self.query.push((name, value));
                }
                Ok(self)
            }
            Value::Null => Ok(self),
            other => Err(ApiError::Validation(format!(
                "Query parameters must be an object, got {other}"
            ))),
        }
    }
}

/// HTTP client for the relayer.
pub struct RestClient {
    client: Client,
    config: ApiConfig,
    auth: RwLock<AuthContext>,
}

impl RestClient {
    /// Create a client without credentials.
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        Self::with_auth(config, AuthContext::default())
    }

    pub fn with_auth(config: ApiConfig, auth: AuthContext) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            auth: RwLock::new(auth),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.read().is_authenticated()
    }

    fn is_refreshable(&self) -> bool {
        self.auth.read().is_refreshable()
    }

    /// Current session token, used for stream authentication.
    pub fn session_token(&self) -> Option<String> {
        self.auth.read().id_token().map(str::to_string)
    }

    /// Store API key credentials and obtain session tokens.
    pub async fn set_api_key(
        &self,
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> ApiResult<()> {
        let key = key.into();
        let secret = secret.into();
        let spec = RequestSpec::post(
            self.config.endpoints.auth_token.clone(),
            json!({ "apiKey": key, "secret": secret }),
        );
        self.auth
            .write()
            .set_credentials(Credentials::ApiKey { key, secret });

        let response = self.send(&spec).await?;
        let tokens = SessionTokens::from_response(response)?;
        self.auth.write().set_tokens(tokens);
        info!("Authenticated with API key");
        Ok(())
    }

    /// Exchange the held refresh token for new session tokens.
    pub async fn refresh_tokens(&self) -> ApiResult<()> {
        let body = self.auth.read().refresh_body();
        let Some(body) = body else {
            return Err(ApiError::NotAuthenticated(
                "no refreshable credential".to_string(),
            ));
        };
        let spec = RequestSpec::post(self.config.endpoints.auth_refresh.clone(), body);
        let response = self.send(&spec).await?;
        let tokens = SessionTokens::from_response(response)?;
        self.auth.write().set_tokens(tokens);
        debug!("Session tokens refreshed");
        Ok(())
    }

    /// Issue a request with the default retry budget.
    pub async fn auth_request(&self, spec: &RequestSpec) -> ApiResult<Value> {
        self.auth_request_with_retries(spec, DEFAULT_AUTH_RETRIES)
            .await
    }

    /// Issue a request, refreshing and replaying it on 401 while a
    /// refreshable credential exists and budget remains.
    ///
    /// The initial attempt is free; each refresh consumes one unit of
    /// `retries`. A 401 with no budget left fails with
    /// [`ApiError::TooManyAuthRetries`]. Any other failure returns at once.
    pub async fn auth_request_with_retries(
        &self,
        spec: &RequestSpec,
        retries: u32,
    ) -> ApiResult<Value> {
        let mut remaining = retries;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let result = self.send(spec).await;
            match result {
                Err(err) if err.is_auth_expired() && self.is_refreshable() => {
                    if remaining == 0 {
                        warn!(
                            attempts,
                            path = %spec.path,
                            "Authentication retry budget exhausted"
                        );
                        return Err(ApiError::TooManyAuthRetries { attempts });
                    }
                    remaining -= 1;
                    warn!(
                        attempts,
                        remaining,
                        path = %spec.path,
                        "Session expired, refreshing tokens"
                    );
                    self.refresh_tokens().await?;
                }
                other => return other,
            }
        }
    }

    fn build_url(&self, spec: &RequestSpec) -> ApiResult<Url> {
        let mut url = Url::parse(&self.config.url(&spec.path))
            .map_err(|e| ApiError::Validation(format!("Invalid URL for {}: {e}", spec.path)))?;
        if !spec.query.is_empty() {
            url.query_pairs_mut().extend_pairs(spec.query.iter());
        }
        Ok(url)
    }

    fn auth_headers(
        &self,
        method: &Method,
        url: &Url,
        body: &str,
    ) -> ApiResult<Vec<(&'static str, String)>> {
        let signed_path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        self.auth.read().headers(method.as_str(), &signed_path, body)
    }

    /// Send one request with whatever credentials are held. No retry.
    pub async fn send(&self, spec: &RequestSpec) -> ApiResult<Value> {
        let url = self.build_url(spec)?;
        let body = match &spec.body {
            Some(value) => serde_json::to_string(value)?,
            None => String::new(),
        };
        let headers = self.auth_headers(&spec.method, &url, &body)?;

        debug!(method = %spec.method, path = %spec.path, "Sending request");

        let mut request = self
            .client
            .request(spec.method.clone(), url)
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if spec.body.is_some() {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to read response: {e}")))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
