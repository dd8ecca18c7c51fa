use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// Client for the hosted auth API (token grants, user introspection).
///
/// Sign-in failures keep the backend's own message text so the caller can
/// show it verbatim.
#[derive(Clone)]
pub struct AuthApiService {
    client: Client,
    auth_url: String,
    anon_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    pub user: AuthUser,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

impl AuthApiService {
    pub fn new(client: Client, auth_url: String, anon_key: String) -> Self {
        Self {
            client,
            auth_url,
            anon_key,
        }
    }

    async fn token_request<B: Serialize>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<AuthTokens, AppError> {
        let url = format!("{}/token?grant_type={}", self.auth_url, grant_type);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let payload = response.text().await.unwrap_or_default();
            let message = auth_error_message(&payload)
                .unwrap_or_else(|| format!("authentication failed with status {}", status));
            log::warn!("Auth API {} grant rejected: {} - {}", grant_type, status, message);
            return Err(AppError::Unauthorized(message));
        }

        let tokens = response.json::<AuthTokens>().await?;
        Ok(tokens)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthTokens, AppError> {
        self.token_request("password", &PasswordGrant { email, password })
            .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AppError> {
        self.token_request("refresh_token", &RefreshGrant { refresh_token })
            .await
    }

    /// Introspect the bearer token; an invalid or expired token is an
    /// Unauthorized outcome, not a backend fault.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, AppError> {
        let url = format!("{}/user", self.auth_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized("Session is not valid".to_string()));
        }

        let user = response.json::<AuthUser>().await?;
        Ok(user)
    }

    /// Revoke the session server-side. Best effort: the caller clears
    /// cookies regardless.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let url = format!("{}/logout", self.auth_url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            log::warn!("Auth API logout returned {}", response.status());
        }
        Ok(())
    }
}

/// The auth API mixes `error_description`, `msg` and `message` fields across
/// endpoints; take whichever is present.
fn auth_error_message(payload: &str) -> Option<String> {
    let value: Value = serde_json::from_str(payload).ok()?;
    for key in ["error_description", "msg", "message"] {
        if let Some(text) = value.get(key).and_then(Value::as_str) {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_error_description() {
        let payload = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            auth_error_message(payload).as_deref(),
            Some("Invalid login credentials")
        );
    }

    #[test]
    fn error_message_falls_back_to_msg_then_none() {
        assert_eq!(
            auth_error_message(r#"{"msg":"Email not confirmed"}"#).as_deref(),
            Some("Email not confirmed")
        );
        assert_eq!(auth_error_message("not json"), None);
        assert_eq!(auth_error_message(r#"{"error":"x"}"#), None);
    }
}
