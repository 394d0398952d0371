//! Startup configuration.
//!
//! Read from the process environment, falling back to a `.env` file
//! (`./.env` by default, or the file given with `--env-file`). Variables set in
//! the environment win over the file.
//!
//! ```text
//! SITEFLOW_SERVER_URL=https://poc-ai.siteflow.co   # optional, this is the default
//! SITEFLOW_CLIENT_ID=...                           # required
//! SITEFLOW_CLIENT_SECRET=...                       # required
//! SITEFLOW_PROJECT_ID=...                          # required
//! SITEFLOW_FAMILY_ID=...                           # default family for new flows
//! SITEFLOW_API_PATH=/ext/api/2.0                   # versioned base path
//! SITEFLOW_AUTO_ADVANCE_FIELD=autoAdvance          # phase usage field names
//! SITEFLOW_CAN_BE_SKIPPED_FIELD=canBeSkipped
//! ```

use siteflow_api::{PhaseFieldNames, SessionConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SERVER_URL: &str = "https://poc-ai.siteflow.co";

/// Error loading configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Client ID or Client Secret not found. Please set SITEFLOW_CLIENT_ID and SITEFLOW_CLIENT_SECRET in your environment or .env file."
    )]
    MissingCredentials,
    #[error(
        "Project ID not found. Please set SITEFLOW_PROJECT_ID in your environment or .env file."
    )]
    MissingProject,
    #[error("failed to read {}: {message}", path.display())]
    EnvFile { path: PathBuf, message: String },
}

/// Resolved configuration for one API account.
#[derive(Debug, Clone)]
pub struct SiteflowConfig {
    pub server_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub project_id: String,
    pub family_id: Option<String>,
    pub api_path: Option<String>,
    pub phase_fields: PhaseFieldNames,
}

impl SiteflowConfig {
    /// Load from the process environment and an optional env file.
    ///
    /// Without an explicit file, `./.env` is used when present.
    pub fn load(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(env_file, |key| std::env::var(key).ok())
    }

    /// Like [`load`](Self::load), with an injectable environment.
    pub fn load_with<F>(env_file: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = match env_file {
            Some(path) => read_env_file(path)?,
            None => {
                let default = Path::new(".env");
                if default.is_file() {
                    read_env_file(default)?
                } else {
                    HashMap::new()
                }
            }
        };
        Self::from_lookup(|key| env(key).or_else(|| file_vars.get(key).cloned()))
    }

    /// Build from a variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let (client_id, client_secret) =
            match (get("SITEFLOW_CLIENT_ID"), get("SITEFLOW_CLIENT_SECRET")) {
                (Some(id), Some(secret)) => (id, secret),
                _ => return Err(ConfigError::MissingCredentials),
            };
        let project_id = get("SITEFLOW_PROJECT_ID").ok_or(ConfigError::MissingProject)?;

        let defaults = PhaseFieldNames::default();
        Ok(Self {
            server_url: get("SITEFLOW_SERVER_URL")
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            client_id,
            client_secret,
            project_id,
            family_id: get("SITEFLOW_FAMILY_ID"),
            api_path: get("SITEFLOW_API_PATH"),
            phase_fields: PhaseFieldNames {
                auto_advance: get("SITEFLOW_AUTO_ADVANCE_FIELD").unwrap_or(defaults.auto_advance),
                can_be_skipped: get("SITEFLOW_CAN_BE_SKIPPED_FIELD")
                    .unwrap_or(defaults.can_be_skipped),
            },
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            server_url: self.server_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            project_id: self.project_id.clone(),
            family_id: self.family_id.clone(),
            api_path: self.api_path.clone(),
        }
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let to_error = |e: dotenvy::Error| ConfigError::EnvFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(to_error)? {
        let (key, value) = item.map_err(to_error)?;
        vars.insert(key, value);
    }
    Ok(vars)
}
