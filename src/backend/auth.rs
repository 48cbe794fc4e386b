// Session handles per profile. The token authenticator reads a bearer token and, when it
// has expired, runs the configured login command to refresh it.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{Authenticator, CloudBackend, FixtureBackend, HttpBackend, HttpBackendConfig};
use crate::config::{AuthConfig, BackendConfig};
use crate::error::BackendError;

const PROFILE_PLACEHOLDER: &str = "{profile}";

pub struct TokenAuthenticator {
    backend: BackendConfig,
    auth: AuthConfig,
}

impl TokenAuthenticator {
    pub fn new(backend: BackendConfig, auth: AuthConfig) -> Self {
        Self { backend, auth }
    }

    pub fn token_path(&self, profile: &str) -> PathBuf {
        PathBuf::from(&self.auth.token_dir).join(format!("{profile}.token"))
    }

    /// Env var wins over the token file, so CI can inject a token without touching disk.
    fn read_token(&self, profile: &str) -> Result<String, BackendError> {
        if let Some(var) = &self.auth.token_env
            && let Ok(token) = std::env::var(var)
            && !token.trim().is_empty()
        {
            return Ok(token.trim().to_string());
        }
        let path = self.token_path(profile);
        match std::fs::read_to_string(&path) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            Ok(_) | Err(_) => {
                debug!(path = %path.display(), "no usable token for profile");
                Err(BackendError::ExpiredCredentials)
            }
        }
    }

    /// Writes the last non-empty line of `stdout` to the profile's token file.
    fn store_token(&self, profile: &str, stdout: &str) -> Result<(), BackendError> {
        let Some(token) = stdout.lines().map(str::trim).rev().find(|l| !l.is_empty()) else {
            return Err(BackendError::Unavailable(
                "login command printed no token".to_string(),
            ));
        };
        let path = self.token_path(profile);
        let write = || -> std::io::Result<()> {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(&path, format!("{token}\n"))
        };
        write().map_err(|e| {
            BackendError::Unavailable(format!("token file {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "stored token from login command");
        Ok(())
    }

    /// Login command argv with the profile substituted.
    pub fn login_argv(&self, profile: &str) -> Vec<String> {
        self.auth
            .login_command
            .iter()
            .map(|arg| arg.replace(PROFILE_PLACEHOLDER, profile))
            .collect()
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn open_session(&self, profile: &str) -> Result<Arc<dyn CloudBackend>, BackendError> {
        let token = self.read_token(profile)?;
        let backend = HttpBackend::new(HttpBackendConfig {
            base_url: self.backend.base_url.clone(),
            token,
            max_retries: self.backend.max_retries,
            timeout_secs: self.backend.timeout_secs,
        })?;
        Ok(Arc::new(backend))
    }

    async fn reauthenticate(&self, profile: &str) -> Result<(), BackendError> {
        let argv = self.login_argv(profile);
        let Some((program, args)) = argv.split_first() else {
            return Err(BackendError::Unavailable(
                "auth.login_command is empty".to_string(),
            ));
        };

        let stale = self.read_token(profile).ok();
        info!(profile, program = %program, "session expired, running login command");
        let stdout = if self.auth.login_prints_token {
            Stdio::piped()
        } else {
            Stdio::inherit()
        };
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|e| BackendError::Unavailable(format!("login command {program}: {e}")))?;

        if !output.status.success() {
            return Err(BackendError::Unavailable(format!(
                "login command {program} exited with {}",
                output.status
            )));
        }
        if self.auth.login_prints_token {
            self.store_token(profile, &String::from_utf8_lossy(&output.stdout))?;
        }

        // The login must leave a different token behind.
        match self.read_token(profile) {
            Ok(fresh) if Some(&fresh) != stale.as_ref() => {
                info!(profile, "logged in successfully");
                Ok(())
            }
            _ => Err(BackendError::Unavailable(format!(
                "login command {program} did not refresh the token for profile {profile}"
            ))),
        }
    }
}

/// Hands out the same fixture backend for every profile; nothing to refresh.
pub struct FixtureAuthenticator {
    backend: Arc<FixtureBackend>,
}

impl FixtureAuthenticator {
    pub fn new(backend: FixtureBackend) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }
}

#[async_trait]
impl Authenticator for FixtureAuthenticator {
    async fn open_session(&self, _profile: &str) -> Result<Arc<dyn CloudBackend>, BackendError> {
        Ok(self.backend.clone())
    }

    async fn reauthenticate(&self, _profile: &str) -> Result<(), BackendError> {
        Ok(())
    }
}
