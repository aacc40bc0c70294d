//! HTTP client for Yggdrasil-compatible auth servers.
//!
//! Endpoints are resolved against the configured base URL:
//! `/authenticate`, `/validate`, `/refresh` and `/invalidate`, all `POST`
//! with JSON bodies.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::{IdentityProvider, ProviderError, RefreshedToken, RemoteIdentity};

// ============================================================================
// Constants
// ============================================================================

/// Account `type` recorded for accounts issued by this client
pub const PROVIDER_TYPE: &str = "yggdrasil";

/// Game agent sent with authenticate requests
const AGENT_NAME: &str = "Minecraft";
const AGENT_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct Agent {
    name: &'static str,
    version: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateRequest<'a> {
    agent: Agent,
    username: &'a str,
    password: &'a str,
    request_user: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateResponse {
    access_token: String,
    selected_profile: Option<Profile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
}

/// Auth server client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct YggdrasilClient {
    client: Client,
    base_url: String,
}

impl YggdrasilClient {
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ProviderError::from_status(status, &body))
        }
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = self.endpoint(path);
        debug!(url = %url, "Auth server request");
        Ok(self.client.post(&url).json(body).send().await?)
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let response = Self::check_response(self.post(path, body).await?).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ProviderError::InvalidResponse(format!("{} response: {}", path, e)))
    }

    /// A rejected token is a normal "invalid" answer, not an error.
    fn validate_outcome(status: StatusCode, body: &str) -> Result<bool, ProviderError> {
        if status.is_success() {
            return Ok(true);
        }
        match ProviderError::from_status(status, body) {
            ProviderError::Forbidden(_) => Ok(false),
            other => Err(other),
        }
    }

    fn identity_from(response: AuthenticateResponse) -> Result<RemoteIdentity, ProviderError> {
        let profile = response.selected_profile.ok_or_else(|| {
            ProviderError::InvalidResponse(
                "authenticate response has no selected profile".to_string(),
            )
        })?;
        Ok(RemoteIdentity {
            id: profile.id,
            display_name: profile.name,
            access_token: response.access_token,
        })
    }
}

#[async_trait]
impl IdentityProvider for YggdrasilClient {
    fn provider_type(&self) -> &str {
        PROVIDER_TYPE
    }

    async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<RemoteIdentity, ProviderError> {
        let request = AuthenticateRequest {
            agent: Agent {
                name: AGENT_NAME,
                version: AGENT_VERSION,
            },
            username: identifier,
            password: secret,
            request_user: true,
        };
        let response: AuthenticateResponse = self.post_json("authenticate", &request).await?;
        Self::identity_from(response)
    }

    async fn validate(
        &self,
        access_token: &str,
        client_token: Option<&str>,
    ) -> Result<bool, ProviderError> {
        let request = TokenRequest {
            access_token,
            client_token,
        };
        let response = self.post("validate", &request).await?;
        let status = response.status();
        let body = if status.is_success() {
            String::new()
        } else {
            response.text().await.unwrap_or_default()
        };
        Self::validate_outcome(status, &body)
    }

    async fn refresh(
        &self,
        access_token: &str,
        client_token: Option<&str>,
    ) -> Result<RefreshedToken, ProviderError> {
        let request = TokenRequest {
            access_token,
            client_token,
        };
        let response: RefreshResponse = self.post_json("refresh", &request).await?;
        Ok(RefreshedToken {
            access_token: response.access_token,
        })
    }

    async fn invalidate(
        &self,
        access_token: &str,
        client_token: Option<&str>,
    ) -> Result<(), ProviderError> {
        let request = TokenRequest {
            access_token,
            client_token,
        };
        Self::check_response(self.post("invalidate", &request).await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = YggdrasilClient::with_timeout(
            "https://auth.example.org/authserver/",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url(), "https://auth.example.org/authserver");
        assert_eq!(
            client.endpoint("validate"),
            "https://auth.example.org/authserver/validate"
        );
    }

    #[test]
    fn test_authenticate_request_shape() {
        let request = AuthenticateRequest {
            agent: Agent {
                name: AGENT_NAME,
                version: AGENT_VERSION,
            },
            username: "alice@example.org",
            password: "hunter2",
            request_user: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["agent"]["name"], "Minecraft");
        assert_eq!(value["agent"]["version"], 1);
        assert_eq!(value["username"], "alice@example.org");
        assert_eq!(value["requestUser"], true);
    }

    #[test]
    fn test_token_request_omits_missing_client_token() {
        let value = serde_json::to_value(TokenRequest {
            access_token: "tok1",
            client_token: None,
        })
        .unwrap();
        assert_eq!(value, serde_json::json!({ "accessToken": "tok1" }));

        let value = serde_json::to_value(TokenRequest {
            access_token: "tok1",
            client_token: Some("u1"),
        })
        .unwrap();
        assert_eq!(value["clientToken"], "u1");
    }

    #[test]
    fn test_parse_authenticate_response() {
        let json = r#"{"accessToken":"tok1","clientToken":"c1","availableProfiles":[{"id":"u1","name":"Alice"}],"selectedProfile":{"id":"u1","name":"Alice"},"user":{"id":"x","properties":[]}}"#;
        let response: AuthenticateResponse = serde_json::from_str(json).unwrap();
        let identity = YggdrasilClient::identity_from(response).unwrap();
        assert_eq!(identity.id, "u1");
        assert_eq!(identity.display_name, "Alice");
        assert_eq!(identity.access_token, "tok1");
    }

    #[test]
    fn test_authenticate_response_without_profile() {
        let response: AuthenticateResponse =
            serde_json::from_str(r#"{"accessToken":"tok1","availableProfiles":[]}"#).unwrap();
        assert!(matches!(
            YggdrasilClient::identity_from(response),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_validate_outcome() {
        assert!(YggdrasilClient::validate_outcome(StatusCode::NO_CONTENT, "").unwrap());

        let invalid = r#"{"error":"ForbiddenOperationException","errorMessage":"Invalid token"}"#;
        assert!(!YggdrasilClient::validate_outcome(StatusCode::FORBIDDEN, invalid).unwrap());

        let outage = YggdrasilClient::validate_outcome(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(matches!(outage, Err(e) if e.is_unavailable()));
    }
}
