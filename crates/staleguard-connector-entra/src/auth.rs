//! Client-credentials session against the Entra ID token endpoint.

use chrono::{DateTime, Duration, Utc};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::{EntraConfig, EntraCredentials, EntraError, EntraResult};

/// Tokens are refreshed this long before they expire.
const REFRESH_GRACE_MINUTES: i64 = 5;

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    expires_in: i64,
}

/// Error body returned by the token endpoint, e.g. `invalid_client`.
#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn usable_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::minutes(REFRESH_GRACE_MINUTES) < self.expires_at
    }
}

/// Holds the app-only access token for one tenant.
///
/// Concurrent callers that find the token stale wait for a single refresh.
#[derive(Debug)]
pub struct TokenCache {
    credentials: EntraCredentials,
    token_url: String,
    scope: String,
    http_client: reqwest::Client,
    current: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    /// Token cache for the tenant and cloud in `config`.
    pub fn new(credentials: EntraCredentials, config: &EntraConfig) -> Self {
        Self {
            credentials,
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                config.login_endpoint(),
                config.tenant_id
            ),
            scope: format!("{}/.default", config.graph_endpoint()),
            http_client: reqwest::Client::new(),
            current: Mutex::new(None),
        }
    }

    /// Bearer token for Graph requests, requested anew when missing or near expiry.
    pub async fn get_token(&self) -> EntraResult<String> {
        let mut current = self.current.lock().await;

        if let Some(token) = current.as_ref().filter(|t| t.usable_at(Utc::now())) {
            return Ok(token.value.clone());
        }

        let token = self.request_token().await?;
        let value = token.value.clone();
        *current = Some(token);
        Ok(value)
    }

    /// Drop the held token so the next call requests a new one.
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }

    #[instrument(skip(self), fields(client_id = %self.credentials.client_id))]
    async fn request_token(&self) -> EntraResult<AccessToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.expose_secret()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| EntraError::Auth(format!("token endpoint unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EntraError::Auth(describe_token_failure(status, &body)));
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| EntraError::Auth(format!("malformed token response: {e}")))?;

        let expires_at = Utc::now() + Duration::seconds(grant.expires_in);
        debug!(%expires_at, "Access token issued");

        Ok(AccessToken {
            value: grant.access_token,
            expires_at,
        })
    }
}

fn describe_token_failure(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<TokenErrorBody>(body) {
        Ok(err) => match err.error_description {
            Some(description) => format!("{} ({}): {}", err.error, status, description),
            None => format!("{} ({})", err.error, status),
        },
        Err(_) => format!("token endpoint returned {status}"),
    }
}
