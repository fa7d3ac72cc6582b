//! Client-side settings
//!
//! The values a user wants attached to every review request: a credential
//! override, a model override and the server to talk to. They are an
//! explicit value handed to request construction, persisted through a
//! [`SettingsStore`].

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_CREDENTIAL_PREFIX;
use crate::review::ReviewRequest;
use crate::{Error, Result};

/// Server used when settings name none
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Persisted client preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Credential sent as `apiKey`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model sent as `model`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Base URL of the review server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

impl ClientSettings {
    /// Build a review request for `query` carrying these settings
    pub fn build_request(&self, query: impl Into<String>) -> Result<ReviewRequest> {
        let mut request = ReviewRequest::new(query)?;
        if let Some(key) = non_blank(self.api_key.as_deref()) {
            request = request.with_api_key(key);
        }
        if let Some(model) = non_blank(self.model.as_deref()) {
            request = request.with_model(model);
        }
        Ok(request)
    }

    /// Server URL, falling back to the local default
    pub fn server_url(&self) -> &str {
        non_blank(self.server_url.as_deref()).unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Trim values, drop blanks and check the credential prefix
    pub fn normalized(self) -> Result<Self> {
        let api_key = non_blank(self.api_key.as_deref()).map(str::to_string);
        if let Some(ref key) = api_key {
            if !key.starts_with(DEFAULT_CREDENTIAL_PREFIX) {
                return Err(Error::InvalidCredentialFormat {
                    prefix: DEFAULT_CREDENTIAL_PREFIX.to_string(),
                });
            }
        }

        Ok(Self {
            api_key,
            model: non_blank(self.model.as_deref()).map(str::to_string),
            server_url: non_blank(self.server_url.as_deref()).map(str::to_string),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Persistence for [`ClientSettings`]
pub trait SettingsStore: Send + Sync {
    /// Load settings, returning defaults when nothing is stored
    fn load(&self) -> Result<ClientSettings>;

    /// Persist settings after normalizing them
    fn save(&self, settings: &ClientSettings) -> Result<()>;

    /// Remove all stored settings
    fn clear(&self) -> Result<()>;
}

/// TOML file store, owner-only on Unix
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    /// Store settings at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store settings at the default location
    pub fn at_default_path() -> Result<Self> {
        Self::default_path()
            .map(Self::new)
            .ok_or_else(|| Error::Config("Could not determine settings path".to_string()))
    }

    /// Get the default settings file path
    ///
    /// Returns `~/.config/litrev/settings.toml` on Unix
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("litrev").join("settings.toml"))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<ClientSettings> {
        if !self.path.exists() {
            return Ok(ClientSettings::default());
        }

        // The file may hold a credential
        #[cfg(unix)]
        crate::secrets::check_owner_only(&self.path)?;

        let contents = std::fs::read_to_string(&self.path).map_err(Error::Io)?;
        let settings: ClientSettings = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse settings: {}", e)))?;
        settings.normalized()
    }

    fn save(&self, settings: &ClientSettings) -> Result<()> {
        let settings = settings.clone().normalized()?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        let contents = toml::to_string(&settings)
            .map_err(|e| Error::Config(format!("Failed to serialize settings: {}", e)))?;

        // Create with restricted permissions before the credential is written
        std::fs::write(&self.path, "").map_err(Error::Io)?;
        crate::secrets::restrict_to_owner(&self.path)?;
        std::fs::write(&self.path, contents).map_err(Error::Io)?;

        debug!(path = %self.path.display(), "Saved client settings");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<ClientSettings>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<ClientSettings> {
        let settings = self
            .settings
            .lock()
            .map_err(|_| Error::Config("Settings lock poisoned".to_string()))?;
        Ok(settings.clone())
    }

    fn save(&self, settings: &ClientSettings) -> Result<()> {
        let normalized = settings.clone().normalized()?;
        let mut stored = self
            .settings
            .lock()
            .map_err(|_| Error::Config("Settings lock poisoned".to_string()))?;
        *stored = normalized;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.save(&ClientSettings::default())
    }
}
