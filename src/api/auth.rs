use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info};
use serde_json::{Value, json};
use std::time::Duration;

use super::client::read_json;
use super::constants::{self, headers};
use super::models::{AuthUser, Role, Session, TokenResponse};

/// What the auth service did with a sign-up
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// Account is active and signed in
    SignedIn(Session),
    /// Account exists but the email address must be confirmed first
    ConfirmationRequired { email: String },
}

/// Talks to the auth service: password sign-in, refresh, sign-up, admin role updates
pub struct AuthManager {
    base_url: String,
    anon_key: String,
    http_client: reqwest::Client,
}

impl AuthManager {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("exam-bank/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_custom_client(base_url, anon_key, http_client))
    }

    pub fn with_custom_client(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: anon_key.into(),
            http_client,
        }
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        info!("Signing in as {}", email);
        let url = constants::token_endpoint(&self.base_url, "password");

        let response = self
            .http_client
            .post(&url)
            .header(headers::API_KEY, &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Could not reach the auth service")?;

        debug!("Token request status: {}", response.status());
        let value = read_json(response).await?;
        let token: TokenResponse =
            serde_json::from_value(value).context("No access token in response")?;

        let session = token.into_session(Utc::now());
        info!("Signed in as user {} (role: {:?})", session.user.id, session.user.role);
        Ok(session)
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        debug!("Refreshing session");
        let url = constants::token_endpoint(&self.base_url, "refresh_token");

        let response = self
            .http_client
            .post(&url)
            .header(headers::API_KEY, &self.anon_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .context("Could not reach the auth service")?;

        let value = read_json(response).await?;
        let token: TokenResponse =
            serde_json::from_value(value).context("No access token in refresh response")?;
        Ok(token.into_session(Utc::now()))
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        info!("Registering {}", email);
        let url = constants::signup_endpoint(&self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header(headers::API_KEY, &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Could not reach the auth service")?;

        let value = read_json(response).await?;
        parse_sign_up(value, email)
    }

    /// Revoke the session's refresh tokens on the server
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let url = constants::logout_endpoint(&self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header(headers::API_KEY, &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .context("Could not reach the auth service")?;

        read_json(response).await?;
        Ok(())
    }

    /// Write `app_metadata.role` for a user; needs the service role key
    pub async fn set_user_role(&self, service_role_key: &str, user_id: &str, role: Role) -> Result<()> {
        info!("Setting role of {} to {}", user_id, role);
        let url = constants::admin_user_endpoint(&self.base_url, user_id);

        let response = self
            .http_client
            .put(&url)
            .header(headers::API_KEY, service_role_key)
            .bearer_auth(service_role_key)
            .json(&json!({ "app_metadata": { "role": role.as_str() } }))
            .send()
            .await
            .context("Could not reach the auth service")?;

        read_json(response).await?;
        Ok(())
    }
}

/// Auto-confirmed projects answer with a session, others with just the user
fn parse_sign_up(value: Value, email: &str) -> Result<SignUpOutcome> {
    if value.get("access_token").is_some() {
        let token: TokenResponse =
            serde_json::from_value(value).context("Unexpected sign-up response")?;
        return Ok(SignUpOutcome::SignedIn(token.into_session(Utc::now())));
    }

    let user_value = value.get("user").cloned().unwrap_or(value);
    let user: AuthUser = serde_json::from_value(user_value).context("Unexpected sign-up response")?;
    Ok(SignUpOutcome::ConfirmationRequired {
        email: user.email.unwrap_or_else(|| email.to_string()),
    })
}
