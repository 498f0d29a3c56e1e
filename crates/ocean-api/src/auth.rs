//! Credentials and session state for authenticated requests.
//!
//! `AuthContext` is owned by the REST client. It is created with the
//! client, read by every outgoing request and replaced only by the token
//! refresh path.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use std::fmt;

use crate::error::{ApiError, ApiResult};

pub const HEADER_ACCESS_KEY: &str = "TOX-ACCESS-KEY";
pub const HEADER_ACCESS_SIGN: &str = "TOX-ACCESS-SIGN";
pub const HEADER_ACCESS_TIMESTAMP: &str = "TOX-ACCESS-TIMESTAMP";

type HmacSha256 = Hmac<Sha256>;

/// How requests are authenticated.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Every request carries an HMAC signature header set.
    ApiKey { key: String, secret: String },
    /// Requests carry a bearer session token.
    Session { username: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey { key, .. } => f
                .debug_struct("ApiKey")
                .field("key", key)
                .field("secret", &"<redacted>")
                .finish(),
            Self::Session { username } => f
                .debug_struct("Session")
                .field("username", username)
                .finish(),
        }
    }
}

/// A token field the relayer sends either as a plain string or wrapped
/// (`{"jwtToken": ..}` / `{"token": ..}`).
#[derive(Deserialize)]
#[serde(untagged)]
enum TokenField {
    Plain(String),
    Wrapped {
        #[serde(alias = "jwtToken")]
        token: String,
    },
}

impl From<TokenField> for String {
    fn from(field: TokenField) -> Self {
        match field {
            TokenField::Plain(token) | TokenField::Wrapped { token } => token,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokens {
    id_token: TokenField,
    #[serde(default)]
    refresh_token: Option<TokenField>,
}

/// Session tokens issued by `/auth/token` or `/auth/refresh`.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct SessionTokens {
    pub id_token: String,
    pub refresh_token: Option<String>,
}

impl SessionTokens {
    pub fn new(id_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            id_token: id_token.into(),
            refresh_token,
        }
    }

    /// Parse a token response body.
    pub fn from_response(value: Value) -> ApiResult<Self> {
        let raw: RawTokens = serde_json::from_value(value)?;
        Ok(Self {
            id_token: raw.id_token.into(),
            refresh_token: raw.refresh_token.map(Into::into),
        })
    }
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("id_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// Credential and token state for one client.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    credentials: Option<Credentials>,
    tokens: Option<SessionTokens>,
}

impl AuthContext {
    pub fn new(credentials: Option<Credentials>, tokens: Option<SessionTokens>) -> Self {
        Self {
            credentials,
            tokens,
        }
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    pub fn id_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.id_token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some() || self.tokens.is_some()
    }

    /// A credential can be refreshed when it exists and a refresh token is held.
    pub fn is_refreshable(&self) -> bool {
        self.credentials.is_some()
            && self
                .tokens
                .as_ref()
                .is_some_and(|t| t.refresh_token.is_some())
    }

    /// Store new tokens. A response without a refresh token keeps the old one.
    pub fn set_tokens(&mut self, tokens: SessionTokens) {
        let previous_refresh = self.tokens.take().and_then(|t| t.refresh_token);
        self.tokens = Some(SessionTokens {
            refresh_token: tokens.refresh_token.or(previous_refresh),
            ..tokens
        });
    }

    /// Body of the `/auth/refresh` request, if refreshable.
    pub fn refresh_body(&self) -> Option<Value> {
        let refresh_token = self.tokens.as_ref()?.refresh_token.as_ref()?;
        match self.credentials.as_ref()? {
            Credentials::ApiKey { key, .. } => Some(json!({
                "apiKey": key,
                "refreshToken": refresh_token,
            })),
            Credentials::Session { username } => Some(json!({
                "username": username,
                "refreshToken": refresh_token,
            })),
        }
    }

    /// Headers for one request. `path` includes the query string, if any.
    pub fn headers(
        &self,
        method: &str,
        path: &str,
        body: &str,
    ) -> ApiResult<Vec<(&'static str, String)>> {
        self.headers_at(chrono::Utc::now().timestamp(), method, path, body)
    }

    pub(crate) fn headers_at(
        &self,
        timestamp: i64,
        method: &str,
        path: &str,
        body: &str,
    ) -> ApiResult<Vec<(&'static str, String)>> {
        let mut headers = Vec::new();
        if let Some(Credentials::ApiKey { key, secret }) = &self.credentials {
            let timestamp = timestamp.to_string();
            let signature = sign_request(secret, &timestamp, method, path, body)?;
            headers.push((HEADER_ACCESS_KEY, key.clone()));
            headers.push((HEADER_ACCESS_SIGN, signature));
            headers.push((HEADER_ACCESS_TIMESTAMP, timestamp));
        }
        if let Some(token) = self.id_token() {
            headers.push(("Authorization", format!("Bearer {token}")));
        }
        Ok(headers)
    }
}

/// Base64 HMAC-SHA256 over `timestamp + METHOD + path + body`.
pub fn sign_request(
    secret: &str,
    timestamp: &str,
    method: &str,
    path: &str,
    body: &str,
) -> ApiResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ApiError::Validation(format!("Invalid API secret: {e}")))?;
    mac.update(timestamp.as_bytes());
    mac.update(method.to_uppercase().as_bytes());
    mac.update(path.as_bytes());
    mac.update(body.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_key() -> Credentials {
        Credentials::ApiKey {
            key: "key-1".to_string(),
            secret: "s3cret".to_string(),
        }
    }

    #[test]
    fn test_sign_request_is_deterministic() {
        let a = sign_request("s3cret", "1700000000", "post", "/order", "{}").unwrap();
        let b = sign_request("s3cret", "1700000000", "POST", "/order", "{}").unwrap();
        let c = sign_request("s3cret", "1700000001", "POST", "/order", "{}").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        // 32-byte digest in standard base64
        assert_eq!(a.len(), 44);
    }

    #[test]
    fn test_api_key_headers() {
        let ctx = AuthContext::new(Some(api_key()), None);
        let headers = ctx.headers_at(1_700_000_000, "GET", "/user_data", "").unwrap();
        let names: Vec<_> = headers.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![HEADER_ACCESS_KEY, HEADER_ACCESS_SIGN, HEADER_ACCESS_TIMESTAMP]
        );
        assert_eq!(headers[0].1, "key-1");
        assert_eq!(
            headers[1].1,
            sign_request("s3cret", "1700000000", "GET", "/user_data", "").unwrap()
        );
        assert_eq!(headers[2].1, "1700000000");
    }

    #[test]
    fn test_session_headers_use_bearer() {
        let ctx = AuthContext::new(
            Some(Credentials::Session {
                username: "alice".to_string(),
            }),
            Some(SessionTokens::new("id-1", Some("r-1".to_string()))),
        );
        let headers = ctx.headers("GET", "/user_data", "").unwrap();
        assert_eq!(headers, vec![("Authorization", "Bearer id-1".to_string())]);
    }

    #[test]
    fn test_refreshable_requires_refresh_token() {
        let mut ctx = AuthContext::new(Some(api_key()), None);
        assert!(!ctx.is_refreshable());
        assert!(ctx.refresh_body().is_none());

        ctx.set_tokens(SessionTokens::new("id-1", Some("r-1".to_string())));
        assert!(ctx.is_refreshable());
        assert_eq!(
            ctx.refresh_body().unwrap(),
            json!({ "apiKey": "key-1", "refreshToken": "r-1" })
        );

        assert!(!AuthContext::default().is_refreshable());
    }

    #[test]
    fn test_set_tokens_keeps_previous_refresh_token() {
        let mut ctx = AuthContext::new(Some(api_key()), None);
        ctx.set_tokens(SessionTokens::new("id-1", Some("r-1".to_string())));
        ctx.set_tokens(SessionTokens::new("id-2", None));
        assert_eq!(ctx.id_token(), Some("id-2"));
        assert!(ctx.is_refreshable());
    }

    #[test]
    fn test_tokens_from_wrapped_response() {
        let tokens = SessionTokens::from_response(json!({
            "accessToken": { "jwtToken": "access" },
            "idToken": { "jwtToken": "id-9" },
            "refreshToken": { "token": "r-9" }
        }))
        .unwrap();
        assert_eq!(tokens.id_token, "id-9");
        assert_eq!(tokens.refresh_token.as_deref(), Some("r-9"));

        let plain =
            SessionTokens::from_response(json!({ "idToken": "id-1", "refreshToken": "r-1" }))
                .unwrap();
        assert_eq!(plain, SessionTokens::new("id-1", Some("r-1".to_string())));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", AuthContext::new(Some(api_key()), None));
        assert!(!rendered.contains("s3cret"));
    }
}
