//! Configuration management for litrev
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (LITREV_*, PYTHON_PATH)
//! 3. Config file (~/.config/litrev/config.toml)
//! 4. Default values
//!
//! The default generation credential is not part of this file; see
//! [`crate::secrets`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::relay::OutputContract;
use crate::{Error, Result};

/// Model used when a request does not name one
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Generator script, relative to the working directory
pub const DEFAULT_SCRIPT: &str = "scripts/literature_review_service.py";

/// Prefix every provider credential must carry
pub const DEFAULT_CREDENTIAL_PREFIX: &str = "sk-";

/// Listen address for the HTTP server
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Interpreter used to run the generator script
///
/// Fallback path when neither config nor `PYTHON_PATH` names one: the `py`
/// launcher on Windows, `python` on the search path elsewhere.
pub fn default_program() -> String {
    if cfg!(windows) {
        "py".to_string()
    } else {
        "python".to_string()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
        }
    }
}

/// Generator process configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Interpreter or executable to run
    pub program: String,

    /// Script passed as the single argument to `program`
    pub script: PathBuf,

    /// Directory the generator runs in (relay's own when unset)
    pub workdir: Option<PathBuf>,

    /// Model used when the request has none
    pub default_model: String,

    /// Prefix the resolved credential must start with
    pub credential_prefix: String,

    /// Kill the generator after this long (unset waits forever)
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,

    /// Where the payload lives in the generator's stdout
    pub output: OutputContract,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            script: PathBuf::from(DEFAULT_SCRIPT),
            workdir: None,
            default_model: DEFAULT_MODEL.to_string(),
            credential_prefix: DEFAULT_CREDENTIAL_PREFIX.to_string(),
            timeout: None,
            output: OutputContract::default(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Generator configuration
    pub generator: GeneratorConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/litrev/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("litrev").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - LITREV_ADDR: Server listen address
    /// - PYTHON_PATH: Generator interpreter
    /// - LITREV_SCRIPT: Generator script path
    /// - LITREV_WORKDIR: Generator working directory
    /// - LITREV_MODEL: Default model
    /// - LITREV_TIMEOUT: Generator timeout (e.g. "90s", "5m")
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(addr) = var("LITREV_ADDR") {
            self.server.addr = addr;
        }

        if let Some(program) = var("PYTHON_PATH") {
            self.generator.program = program;
        }

        if let Some(script) = var("LITREV_SCRIPT") {
            self.generator.script = PathBuf::from(script);
        }

        if let Some(workdir) = var("LITREV_WORKDIR") {
            self.generator.workdir = Some(PathBuf::from(workdir));
        }

        if let Some(model) = var("LITREV_MODEL") {
            self.generator.default_model = model;
        }

        if let Some(timeout) = var("LITREV_TIMEOUT") {
            let parsed = humantime_serde::re::humantime::parse_duration(&timeout)
                .map_err(|e| Error::Config(format!("Invalid LITREV_TIMEOUT '{}': {}", timeout, e)))?;
            self.generator.timeout = Some(parsed);
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        addr: Option<String>,
        program: Option<String>,
        model: Option<String>,
    ) -> Self {
        if let Some(addr) = addr {
            self.server.addr = addr;
        }

        if let Some(program) = program {
            self.generator.program = program;
        }

        if let Some(m) = model {
            self.generator.default_model = m;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        config_path: Option<&Path>,
        program: Option<String>,
        model: Option<String>,
    ) -> Result<Self> {
        let base = match config_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };
        Ok(base
            .with_env_overrides()?
            .with_cli_overrides(None, program, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.addr, "0.0.0.0:3000");
        assert_eq!(config.generator.default_model, "openai/gpt-4o-mini");
        assert_eq!(
            config.generator.script,
            PathBuf::from("scripts/literature_review_service.py")
        );
        assert_eq!(config.generator.credential_prefix, "sk-");
        assert!(config.generator.timeout.is_none());
        assert!(config.generator.workdir.is_none());
        assert_eq!(config.generator.output, OutputContract::Braces);
    }

    #[test]
    fn test_default_program_fallback() {
        let expected = if cfg!(windows) { "py" } else { "python" };
        assert_eq!(default_program(), expected);
        assert_eq!(GeneratorConfig::default().program, expected);
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default().with_cli_overrides(
            Some("127.0.0.1:8080".to_string()),
            Some("/opt/python3".to_string()),
            Some("x-ai/grok".to_string()),
        );

        assert_eq!(config.server.addr, "127.0.0.1:8080");
        assert_eq!(config.generator.program, "/opt/python3");
        assert_eq!(config.generator.default_model, "x-ai/grok");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PYTHON_PATH", "/usr/bin/python3"),
            ("LITREV_SCRIPT", "/srv/gen.py"),
            ("LITREV_TIMEOUT", "90s"),
            ("LITREV_WORKDIR", "/srv/litrev"),
            ("LITREV_MODEL", "  "),
        ]
        .into_iter()
        .collect();

        let config = Config::default()
            .with_overrides_from(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.generator.program, "/usr/bin/python3");
        assert_eq!(config.generator.script, PathBuf::from("/srv/gen.py"));
        assert_eq!(config.generator.timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.generator.workdir, Some(PathBuf::from("/srv/litrev")));
        // Blank values are ignored
        assert_eq!(config.generator.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_invalid_timeout_env() {
        let result = Config::default().with_overrides_from(|k| {
            (k == "LITREV_TIMEOUT").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[server]
addr = "127.0.0.1:4000"

[generator]
program = "/usr/local/bin/python3"
script = "gen/service.py"
workdir = "/opt/litrev"
default_model = "anthropic/claude-3.5-sonnet"
timeout = "2m"

[generator.output]
kind = "sentinel"
prefix = "@@REVIEW@@"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:4000");
        assert_eq!(config.generator.program, "/usr/local/bin/python3");
        assert_eq!(config.generator.timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.generator.workdir, Some(PathBuf::from("/opt/litrev")));
        assert_eq!(
            config.generator.output,
            OutputContract::Sentinel {
                prefix: "@@REVIEW@@".to_string()
            }
        );
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
[generator]
default_model = "opus"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.generator.script, PathBuf::from(DEFAULT_SCRIPT));
        assert_eq!(config.generator.default_model, "opus");
        assert_eq!(config.server.addr, DEFAULT_ADDR);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\naddr = \"127.0.0.1:9\"\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:9");

        std::fs::write(&path, "[server\n").unwrap();
        assert!(matches!(
            Config::load_from_file(&path),
            Err(Error::Config(_))
        ));
    }
}
