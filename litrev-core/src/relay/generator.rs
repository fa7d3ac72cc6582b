//! Generator backend abstraction
//!
//! A generator is the external process that actually writes the review.
//! Input is handed over exclusively through environment variables.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::config::{default_program, GeneratorConfig, DEFAULT_SCRIPT};
use crate::{Error, Result};

use super::spawn::{GeneratorHandle, GeneratorOutput};

/// Environment variable carrying the resolved credential
pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
/// Environment variable carrying the research query
pub const ENV_QUERY: &str = "QUERY";
/// Environment variable carrying the resolved model
pub const ENV_MODEL: &str = "MODEL";

/// Fully resolved input for one generator run
#[derive(Clone, PartialEq, Eq)]
pub struct GenerationJob {
    pub query: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for GenerationJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationJob")
            .field("query", &self.query)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

impl GenerationJob {
    /// Variables layered over the inherited environment
    pub fn env_vars(&self) -> [(&'static str, &str); 3] {
        [
            (ENV_API_KEY, self.api_key.as_str()),
            (ENV_QUERY, self.query.as_str()),
            (ENV_MODEL, self.model.as_str()),
        ]
    }
}

/// Trait for review generators
#[async_trait]
pub trait Generator: Send + Sync {
    /// Get the name of this generator
    fn name(&self) -> &'static str;

    /// Run one job to completion
    async fn generate(&self, job: &GenerationJob) -> Result<GeneratorOutput>;

    /// Check if this generator can be launched on the system
    fn is_available(&self) -> bool;
}

/// Runs `<program> <script>` with the job in its environment
#[derive(Debug, Clone)]
pub struct ScriptGenerator {
    pub program: String,
    pub script: PathBuf,
    pub workdir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub env_vars: HashMap<String, String>,
}

impl ScriptGenerator {
    /// Create a script generator with default settings
    pub fn new() -> Self {
        Self {
            program: default_program(),
            script: PathBuf::from(DEFAULT_SCRIPT),
            workdir: None,
            timeout: None,
            env_vars: HashMap::new(),
        }
    }

    /// Create a script generator from configuration
    pub fn from_config(config: &GeneratorConfig) -> Self {
        let generator = Self::new()
            .with_program(config.program.clone())
            .with_script(config.script.clone())
            .with_timeout(config.timeout);
        match config.workdir {
            Some(ref dir) => generator.with_workdir(dir.clone()),
            None => generator,
        }
    }

    /// Set the interpreter or executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the script path
    pub fn with_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.script = script.into();
        self
    }

    /// Run the generator from a specific directory
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    /// Kill the generator if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Build the command for `job`
    ///
    /// The child inherits the relay's environment; job variables win over
    /// extra variables, which win over inherited ones.
    pub fn build_command(&self, job: &GenerationJob) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.script);

        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        for (key, value) in job.env_vars() {
            cmd.env(key, value);
        }

        if let Some(ref workdir) = self.workdir {
            cmd.current_dir(workdir);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        cmd
    }

    /// Spawn the generator for `job` without waiting
    pub fn spawn(&self, job: &GenerationJob) -> Result<GeneratorHandle> {
        if let Some(ref workdir) = self.workdir {
            if !workdir.is_dir() {
                tracing::error!(workdir = %workdir.display(), "Generator working directory not found");
                return Err(Error::ProcessSpawnFailed {
                    program: self.program.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("working directory {} does not exist", workdir.display()),
                    ),
                });
            }
        }

        let child = self.build_command(job).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                tracing::error!(program = %self.program, "Generator executable not found");
            }
            Error::ProcessSpawnFailed {
                program: self.program.clone(),
                source: e,
            }
        })?;

        Ok(GeneratorHandle::new(child, self.program.clone()))
    }

    /// Script path resolved against the working directory
    pub fn script_path(&self) -> PathBuf {
        match self.workdir {
            Some(ref dir) if self.script.is_relative() => dir.join(&self.script),
            _ => self.script.clone(),
        }
    }
}

impl Default for ScriptGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for ScriptGenerator {
    fn name(&self) -> &'static str {
        "script"
    }

    async fn generate(&self, job: &GenerationJob) -> Result<GeneratorOutput> {
        tracing::info!(
            program = %self.program,
            script = %self.script.display(),
            "Spawning generator process"
        );
        let mut handle = self.spawn(job)?;
        handle.collect_with_timeout(self.timeout).await
    }

    fn is_available(&self) -> bool {
        let launches = std::process::Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok();
        launches && self.script_path().is_file()
    }
}
