//! Loading config and building authenticated clients for commands

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use log::{debug, info, warn};

use exam_bank::access::{Access, area_access};
use exam_bank::api::{AuthManager, BackendClient, Role, Session};
use exam_bank::config::{BackendConfig, Config};

/// Tokens this close to expiry are refreshed before use
const REFRESH_MARGIN_SECS: i64 = 60;

pub struct AppContext {
    pub config: Config,
    pub backend: BackendConfig,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let config = Config::load()?;
        let backend = config.resolve_backend()?;
        debug!("Using backend {}", backend.url);
        Ok(Self { config, backend })
    }

    pub fn auth_manager(&self) -> Result<AuthManager> {
        AuthManager::new(
            &self.backend.url,
            &self.backend.anon_key,
            self.config.request_timeout(),
        )
    }

    /// Client carrying only the anon key
    pub fn anonymous_client(&self) -> Result<BackendClient> {
        Ok(BackendClient::new(
            &self.backend.url,
            &self.backend.anon_key,
            self.config.request_timeout(),
        )?
        .with_retry_config(self.config.retry_config()))
    }

    /// Stored session, refreshed and persisted when close to expiry
    pub async fn session(&mut self) -> Result<Session> {
        let session = self
            .config
            .session
            .clone()
            .context("Not signed in. Run 'exam-bank auth login' first")?;

        let now = Utc::now();
        if !session.expires_within(now, Duration::seconds(REFRESH_MARGIN_SECS)) {
            return Ok(session);
        }

        let Some(refresh_token) = session.refresh_token.as_deref() else {
            anyhow::bail!("Session expired. Run 'exam-bank auth login' again");
        };

        info!("Refreshing session for user {}", session.user.id);
        match self.auth_manager()?.refresh(refresh_token).await {
            Ok(refreshed) => {
                self.config.set_session(refreshed.clone())?;
                Ok(refreshed)
            }
            Err(e) => {
                warn!("Session refresh failed: {:#}", e);
                self.config.clear_session()?;
                anyhow::bail!("Session expired and could not be refreshed. Run 'exam-bank auth login' again")
            }
        }
    }

    /// Client acting as the signed-in user
    pub async fn client(&mut self) -> Result<(BackendClient, Session)> {
        let session = self.session().await?;
        let client = self.anonymous_client()?.with_access_token(&session.access_token);
        Ok((client, session))
    }
}

/// Fail unless the signed-in user holds `required`
///
/// The role is fetched from the backend rather than trusted from the stored
/// session.
pub async fn require_role(client: &BackendClient, required: Role) -> Result<Role> {
    let role = client.get_my_role().await.context("Could not determine your role")?;

    match area_access(required, role) {
        Access::Allow => Ok(required),
        Access::Redirect(target) => {
            let found = role.map(|r| r.to_string()).unwrap_or_else(|| "none".to_string());
            anyhow::bail!(
                "This command needs the {} role (your role: {}, you would be sent to {})",
                required,
                found,
                target
            )
        }
    }
}
