//! Secrets management for litrev
//!
//! The default generation credential is kept apart from configuration to
//! avoid accidental sharing. The secrets file lives at
//! `~/.config/litrev/secrets.toml` and must have restrictive permissions
//! (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variable (OPENROUTER_API_KEY)
//! 2. Secrets file (~/.config/litrev/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Environment variable holding the default provider credential
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// OpenRouter configuration
    pub openrouter: OpenRouterSecrets,
}

/// OpenRouter-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenRouterSecrets {
    /// Default API key used when a request carries no override
    pub api_key: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        let secrets_path = Self::default_secrets_path();

        if let Some(path) = secrets_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        check_owner_only(path)?;

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        if let Some(ref mut key) = secrets.openrouter.api_key {
            *key = key.trim().to_string();
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/litrev/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("litrev").join("secrets.toml"))
    }

    /// Get the default credential with environment variable override
    ///
    /// Priority: OPENROUTER_API_KEY env var > secrets file
    pub fn default_credential(&self) -> Option<String> {
        self.default_credential_from(std::env::var(API_KEY_ENV).ok())
    }

    fn default_credential_from(&self, env_value: Option<String>) -> Option<String> {
        if let Some(key) = env_value {
            let key = key.trim().to_string();
            if !key.is_empty() {
                debug!("Using default API key from {} environment variable", API_KEY_ENV);
                return Some(key);
            }
        }

        if let Some(ref key) = self.openrouter.api_key {
            if !key.is_empty() {
                debug!("Using default API key from secrets file");
                return Some(key.clone());
            }
        }

        None
    }

    /// Create a template secrets file at the default location
    ///
    /// Creates parent directories if needed and sets secure permissions
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("Could not determine secrets path".to_string()))?;
        Self::create_template_at(&path)?;
        Ok(path)
    }

    /// Create a template secrets file at `path`
    pub fn create_template_at(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        // Don't overwrite existing file
        if path.exists() {
            return Err(Error::Config(format!(
                "Secrets file already exists at {}",
                path.display()
            )));
        }

        let template = r#"# litrev secrets
# This file contains sensitive credentials - do not share or commit to version control
#
# IMPORTANT: This file must have restrictive permissions (chmod 600)

[openrouter]
# Default OpenRouter API key, used when a request carries no override.
# Create at: https://openrouter.ai/keys
api_key = ""
"#;

        std::fs::write(path, template).map_err(Error::Io)?;
        restrict_to_owner(path)?;

        warn!(path = %path.display(), "Created secrets template - please edit and add your API key");

        Ok(())
    }
}

/// Reject files readable by group or others
#[cfg(unix)]
pub(crate) fn check_owner_only(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path).map_err(Error::Io)?;
    let mode = metadata.permissions().mode();

    if mode & 0o077 != 0 {
        return Err(Error::Config(format!(
            "{} has insecure permissions {:o}. \
             Please run: chmod 600 {}",
            path.display(),
            mode & 0o777,
            path.display()
        )));
    }

    debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "File permissions OK");
    Ok(())
}

/// Set 0600 on Unix, no-op elsewhere
pub(crate) fn restrict_to_owner(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms).map_err(Error::Io)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
