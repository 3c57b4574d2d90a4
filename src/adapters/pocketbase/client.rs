//! PocketBase REST client
//!
//! Authenticates once as an admin and sends the token with every request.

use crate::config::schema::PocketBaseConfig;
use crate::domain::{PocketBaseError, Result};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

/// Authenticated PocketBase client
pub struct PocketBaseClient {
    base_url: String,
    client: Client,
    token: String,
}

impl PocketBaseClient {
    /// Build the HTTP client and authenticate with the admin credentials
    ///
    /// # Errors
    ///
    /// Returns [`PocketBaseError::AuthenticationFailed`] when the server
    /// rejects the credentials, or [`PocketBaseError::RequestFailed`] when it
    /// can't be reached.
    pub async fn connect(config: &PocketBaseConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| PocketBaseError::RequestFailed(format!("Failed to build HTTP client: {e}")))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let url = format!("{base_url}/api/admins/auth-with-password");

        tracing::debug!(url = %url, identity = %config.admin_email, "Authenticating with PocketBase");

        let response = client
            .post(&url)
            .json(&serde_json::json!({
                "identity": config.admin_email,
                "password": config.admin_password.expose_secret().as_ref(),
            }))
            .send()
            .await
            .map_err(|e| PocketBaseError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PocketBaseError::AuthenticationFailed(format!(
                "admin login returned {status}: {body}"
            ))
            .into());
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| PocketBaseError::InvalidResponse(format!("auth response: {e}")))?;

        tracing::info!(base_url = %base_url, "Authenticated with PocketBase");

        Ok(Self {
            base_url,
            client,
            token: auth.token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request builder for `path` relative to the base URL, with auth attached
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("Authorization", &self.token)
    }

    /// Send and decode a JSON response, mapping error statuses
    pub async fn send_json(&self, request: RequestBuilder) -> Result<Value> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| PocketBaseError::InvalidResponse(e.to_string()).into())
    }

    /// Send and return the raw response, mapping error statuses
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| PocketBaseError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(status_error(status, message))
    }
}

fn status_error(status: StatusCode, message: String) -> crate::domain::IndexerError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        PocketBaseError::AuthenticationFailed(format!("{status}: {message}")).into()
    } else {
        PocketBaseError::Status {
            status: status.as_u16(),
            message,
        }
        .into()
    }
}
