use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::models::Session;
use crate::api::resilience::RetryConfig;

pub const ENV_URL: &str = "EXAM_BANK_URL";
pub const ENV_ANON_KEY: &str = "EXAM_BANK_ANON_KEY";
pub const ENV_SERVICE_ROLE_KEY: &str = "EXAM_BANK_SERVICE_ROLE_KEY";

/// Where the hosted backend lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub backend: Option<BackendConfig>,
    pub session: Option<Session>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(skip)]
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Attempts for idempotent reads; writes are always sent once
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    3
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            // Use XDG config directory on Linux
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("exam-bank")
        } else {
            // Use home directory with dot prefix on Windows/Mac
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".exam-bank")
        };

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(Self::get_config_path()?)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self {
                path: Some(config_path.to_path_buf()),
                ..Self::default()
            });
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
        config.path = Some(config_path.to_path_buf());

        debug!(
            "Loaded config (backend configured: {}, signed in: {})",
            config.backend.is_some(),
            config.session.is_some()
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = match &self.path {
            Some(path) => path.clone(),
            None => Self::get_config_path()?,
        };
        debug!("Saving config to: {:?}", config_path);

        if let Some(config_dir) = config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir)
                    .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
                info!("Created config directory: {:?}", config_dir);
            }
        }

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        // The file holds session tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&config_path, fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict permissions on {:?}", config_path))?;
        }

        info!("Config saved successfully");
        Ok(())
    }

    pub fn set_backend(&mut self, url: String, anon_key: String) -> Result<()> {
        let url = url.trim().trim_end_matches('/').to_string();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            anyhow::bail!("Backend URL must start with http:// or https:// (got '{}')", url);
        }
        if anon_key.trim().is_empty() {
            anyhow::bail!("Anon key must not be empty");
        }

        info!("Setting backend to {}", url);
        if self.backend.as_ref().is_some_and(|b| b.url != url) && self.session.is_some() {
            warn!("Backend changed, dropping stored session");
            self.session = None;
        }
        self.backend = Some(BackendConfig {
            url,
            anon_key: anon_key.trim().to_string(),
        });
        self.save()
    }

    pub fn set_session(&mut self, session: Session) -> Result<()> {
        info!("Storing session for user {}", session.user.id);
        self.session = Some(session);
        self.save()
    }

    pub fn clear_session(&mut self) -> Result<()> {
        if self.session.take().is_some() {
            info!("Cleared stored session");
        }
        self.save()
    }

    /// Backend location from the process environment, falling back to the file
    pub fn resolve_backend(&self) -> Result<BackendConfig> {
        self.resolve_backend_with(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::resolve_backend`] with an explicit environment lookup
    pub fn resolve_backend_with<F>(&self, env: F) -> Result<BackendConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_file = self.backend.clone();
        let url = env(ENV_URL)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| from_file.as_ref().map(|b| b.url.clone()));
        let anon_key = env(ENV_ANON_KEY)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| from_file.as_ref().map(|b| b.anon_key.clone()));

        match (url, anon_key) {
            (Some(url), Some(anon_key)) => Ok(BackendConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
            }),
            _ => anyhow::bail!(
                "Backend not configured. Run 'exam-bank auth configure' or set {} and {}",
                ENV_URL,
                ENV_ANON_KEY
            ),
        }
    }

    /// Service role key for admin operations; only ever read from the environment
    pub fn service_role_key() -> Result<String> {
        std::env::var(ENV_SERVICE_ROLE_KEY)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .with_context(|| format!("{} is not set", ENV_SERVICE_ROLE_KEY))
    }

    pub fn get_settings(&self) -> &Settings {
        &self.settings
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.request_timeout_secs.max(1))
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::default().with_max_attempts(self.settings.retry_attempts)
    }

    pub fn update_request_timeout(&mut self, secs: u64) -> Result<()> {
        if secs == 0 {
            anyhow::bail!("Request timeout must be at least 1 second");
        }
        info!("Updating request timeout to: {}s", secs);
        self.settings.request_timeout_secs = secs;
        self.save()
    }

    pub fn update_retry_attempts(&mut self, attempts: u32) -> Result<()> {
        if attempts == 0 {
            anyhow::bail!("Retry attempts must be at least 1");
        }
        info!("Updating retry attempts to: {}", attempts);
        self.settings.retry_attempts = attempts;
        self.save()
    }
}
