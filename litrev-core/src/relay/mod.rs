//! The review request relay
//!
//! Bridges a [`ReviewRequest`] to one generator run: resolve the credential
//! and model, run the generator, pull the JSON payload out of its stdout.
//! The payload is returned untouched.

mod extract;
mod generator;
mod spawn;

pub use extract::OutputContract;
pub use generator::{
    GenerationJob, Generator, ScriptGenerator, ENV_API_KEY, ENV_MODEL, ENV_QUERY,
};
pub use spawn::{GeneratorHandle, GeneratorOutput};

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use crate::config::{Config, DEFAULT_CREDENTIAL_PREFIX, DEFAULT_MODEL};
use crate::review::ReviewRequest;
use crate::{Error, Result};

/// Relay from review requests to generator runs
///
/// Holds no per-request state; clone freely and share across tasks.
#[derive(Clone)]
pub struct ReviewRelay {
    generator: Arc<dyn Generator>,
    default_api_key: Option<String>,
    credential_prefix: String,
    default_model: String,
    contract: OutputContract,
}

impl std::fmt::Debug for ReviewRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewRelay")
            .field("generator", &self.generator.name())
            .field("has_default_api_key", &self.default_api_key.is_some())
            .field("credential_prefix", &self.credential_prefix)
            .field("default_model", &self.default_model)
            .field("contract", &self.contract)
            .finish()
    }
}

impl ReviewRelay {
    /// Create a relay around `generator` with default policy
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            default_api_key: None,
            credential_prefix: DEFAULT_CREDENTIAL_PREFIX.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            contract: OutputContract::default(),
        }
    }

    /// Create a relay running a [`ScriptGenerator`] built from `config`
    pub fn from_config(config: &Config, default_api_key: Option<String>) -> Self {
        let generator = ScriptGenerator::from_config(&config.generator);
        Self::new(Arc::new(generator))
            .with_default_api_key(default_api_key)
            .with_credential_prefix(config.generator.credential_prefix.clone())
            .with_default_model(config.generator.default_model.clone())
            .with_output_contract(config.generator.output.clone())
    }

    /// Set the process-wide fallback credential
    pub fn with_default_api_key(mut self, api_key: Option<String>) -> Self {
        self.default_api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self
    }

    /// Set the prefix every credential must start with
    pub fn with_credential_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.credential_prefix = prefix.into();
        self
    }

    /// Set the model used when a request has none
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set how the payload is located in stdout
    pub fn with_output_contract(mut self, contract: OutputContract) -> Self {
        self.contract = contract;
        self
    }

    /// Whether a fallback credential is configured
    pub fn has_default_api_key(&self) -> bool {
        self.default_api_key.is_some()
    }

    /// Whether the generator looks launchable right now
    pub fn generator_available(&self) -> bool {
        self.generator.is_available()
    }

    /// Resolve credential and model for `request`
    ///
    /// Fails before any process is spawned.
    pub fn prepare(&self, request: ReviewRequest) -> Result<GenerationJob> {
        if request.query.trim().is_empty() {
            return Err(Error::InvalidInput("Invalid query parameter".to_string()));
        }

        let override_key = request
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());
        let using_override = override_key.is_some();

        let api_key = match override_key.or(self.default_api_key.as_deref()) {
            Some(key) => key.to_string(),
            None => {
                error!("Missing API key - no override provided and no default configured");
                return Err(Error::MissingCredential);
            }
        };

        if !api_key.starts_with(&self.credential_prefix) {
            error!(prefix = %self.credential_prefix, "Invalid API key format");
            return Err(Error::InvalidCredentialFormat {
                prefix: self.credential_prefix.clone(),
            });
        }

        let model = request
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model)
            .to_string();

        info!(
            query = %request.query,
            model = %model,
            using_override,
            "Relaying review request"
        );

        Ok(GenerationJob {
            query: request.query,
            api_key,
            model,
        })
    }

    /// Handle one review request end to end
    pub async fn handle(&self, request: ReviewRequest) -> Result<Value> {
        let job = self.prepare(request)?;
        let output = self.generator.generate(&job).await?;
        self.interpret(output)
    }

    /// Turn a finished generator run into the review payload
    pub fn interpret(&self, output: GeneratorOutput) -> Result<Value> {
        if !output.status.success() {
            error!(
                code = ?output.status.code(),
                stderr = %output.stderr,
                "Generator process failed"
            );
            return Err(Error::GenerationProcessFailed {
                code: output.status.code(),
                stderr: output.stderr,
            });
        }

        let Some(payload) = self.contract.extract(&output.stdout) else {
            error!(stdout = %output.stdout, "No JSON output found in generator stdout");
            return Err(Error::NoOutputProduced {
                stdout: output.stdout,
            });
        };

        match serde_json::from_str::<Value>(payload) {
            Ok(value) => {
                info!("Parsed generator response");
                Ok(value)
            }
            Err(e) => {
                error!(error = %e, stdout = %output.stdout, "Failed to parse generator output");
                Err(Error::MalformedOutput {
                    source: e,
                    raw: output.stdout,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[cfg(unix)]
    use std::os::unix::process::ExitStatusExt;

    /// Generator that records jobs and replays canned output
    struct StubGenerator {
        calls: AtomicUsize,
        jobs: Mutex<Vec<GenerationJob>>,
        exit_code: i32,
        stdout: String,
        stderr: String,
    }

    impl StubGenerator {
        fn new(exit_code: i32, stdout: &str, stderr: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                jobs: Mutex::new(Vec::new()),
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_job(&self) -> GenerationJob {
            self.jobs.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[cfg(unix)]
    #[async_trait]
    impl Generator for StubGenerator {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn generate(&self, job: &GenerationJob) -> Result<GeneratorOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.jobs.lock().unwrap().push(job.clone());
            Ok(GeneratorOutput {
                // Raw wait status: exit code lives in the high byte
                status: std::process::ExitStatus::from_raw(self.exit_code << 8),
                stdout: self.stdout.clone(),
                stderr: self.stderr.clone(),
            })
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    const PAYLOAD: &str = r#"{"articles":[],"synthesis":{"fieldOverview":"x","gapsAndChallenges":"y","futureDirections":"z"}}"#;

    fn request(query: &str) -> ReviewRequest {
        ReviewRequest {
            query: query.to_string(),
            api_key: None,
            model: None,
        }
    }

    #[cfg(unix)]
    fn relay(stub: &Arc<StubGenerator>) -> ReviewRelay {
        ReviewRelay::new(stub.clone()).with_default_api_key(Some("sk-default".to_string()))
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_passes_payload_through() {
        let stub = StubGenerator::new(0, &format!("Log line\n{}", PAYLOAD), "");
        let value = relay(&stub)
            .handle(request("federated learning"))
            .await
            .unwrap();

        assert_eq!(
            value,
            json!({
                "articles": [],
                "synthesis": {"fieldOverview": "x", "gapsAndChallenges": "y", "futureDirections": "z"}
            })
        );
        assert_eq!(stub.calls(), 1);

        let job = stub.last_job();
        assert_eq!(job.query, "federated learning");
        assert_eq!(job.api_key, "sk-default");
        assert_eq!(job.model, DEFAULT_MODEL);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unknown_fields_survive() {
        let stub = StubGenerator::new(0, r#"{"articles":[{"title":"t","extra":[1,2]}],"note":"kept"}"#, "");
        let value = relay(&stub).handle(request("q")).await.unwrap();
        assert_eq!(value["note"], "kept");
        assert_eq!(value["articles"][0]["extra"], json!([1, 2]));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_override_key_and_model_are_trimmed() {
        let stub = StubGenerator::new(0, PAYLOAD, "");
        let mut req = request("q");
        req.api_key = Some("  sk-override  ".to_string());
        req.model = Some(" x-ai/grok ".to_string());

        relay(&stub).handle(req).await.unwrap();

        let job = stub.last_job();
        assert_eq!(job.api_key, "sk-override");
        assert_eq!(job.model, "x-ai/grok");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_blank_override_falls_back_to_default() {
        let stub = StubGenerator::new(0, PAYLOAD, "");
        let mut req = request("q");
        req.api_key = Some("   ".to_string());
        req.model = Some("".to_string());

        relay(&stub).handle(req).await.unwrap();

        let job = stub.last_job();
        assert_eq!(job.api_key, "sk-default");
        assert_eq!(job.model, DEFAULT_MODEL);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invalid_query_never_spawns() {
        let stub = StubGenerator::new(0, PAYLOAD, "");
        for query in ["", "   "] {
            let err = relay(&stub).handle(request(query)).await.unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }
        assert_eq!(stub.calls(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_credential_never_spawns() {
        let stub = StubGenerator::new(0, PAYLOAD, "");
        let relay = ReviewRelay::new(stub.clone()).with_default_api_key(Some("  ".to_string()));
        assert!(!relay.has_default_api_key());

        let err = relay.handle(request("q")).await.unwrap_err();
        assert!(matches!(err, Error::MissingCredential));
        assert_eq!(stub.calls(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_credential_prefix_checked() {
        let stub = StubGenerator::new(0, PAYLOAD, "");
        let mut req = request("q");
        req.api_key = Some("pk-wrong".to_string());

        let err = relay(&stub).handle(req).await.unwrap_err();
        assert!(matches!(err, Error::InvalidCredentialFormat { .. }));
        assert_eq!(stub.calls(), 0);

        let custom = ReviewRelay::new(stub.clone())
            .with_credential_prefix("or-")
            .with_default_api_key(Some("or-123".to_string()));
        custom.handle(request("q")).await.unwrap();
        assert_eq!(stub.calls(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let stub = StubGenerator::new(7, PAYLOAD, "rate limited by provider\n");
        let err = relay(&stub).handle(request("q")).await.unwrap_err();
        match err {
            Error::GenerationProcessFailed { code, ref stderr } => {
                assert_eq!(code, Some(7));
                assert_eq!(stderr, "rate limited by provider\n");
            }
            ref other => panic!("expected GenerationProcessFailed, got {:?}", other),
        }
        assert!(err.to_string().contains("rate limited by provider"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_no_payload() {
        let stub = StubGenerator::new(0, "Retrieving articles...\nDone\n", "");
        let err = relay(&stub).handle(request("q")).await.unwrap_err();
        assert!(matches!(err, Error::NoOutputProduced { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_truncated_payload_is_malformed() {
        let stub = StubGenerator::new(0, r#"{"articles":[{"title":"a"}"#, "");
        let err = relay(&stub).handle(request("q")).await.unwrap_err();
        match err {
            Error::MalformedOutput { raw, .. } => assert!(raw.starts_with("{\"articles\"")),
            other => panic!("expected MalformedOutput, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sentinel_contract_ignores_logged_json() {
        let stdout = format!("{{\"debug\":true}}\n@@REVIEW@@ {}\n", PAYLOAD);
        let stub = StubGenerator::new(0, &stdout, "");
        let relay = relay(&stub).with_output_contract(OutputContract::Sentinel {
            prefix: "@@REVIEW@@".to_string(),
        });

        let value = relay.handle(request("q")).await.unwrap();
        assert_eq!(value["synthesis"]["fieldOverview"], "x");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_repeated_requests_spawn_each_time() {
        let stub = StubGenerator::new(0, PAYLOAD, "");
        let relay = relay(&stub);

        let (a, b) = tokio::join!(relay.handle(request("q")), relay.handle(request("q")));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(stub.calls(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_end_to_end_with_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("gen.sh");
        std::fs::write(
            &script,
            format!("echo 'Log line'\necho '{}'\n", PAYLOAD),
        )
        .unwrap();

        let generator = ScriptGenerator::new().with_program("sh").with_script(script);
        let relay = ReviewRelay::new(Arc::new(generator))
            .with_default_api_key(Some("sk-test".to_string()));

        let value = relay.handle(request("federated learning")).await.unwrap();
        assert_eq!(value, serde_json::from_str::<Value>(PAYLOAD).unwrap());
    }

    #[test]
    fn test_generator_availability() {
        let generator = ScriptGenerator::new().with_program("/nonexistent/python-12345");
        let relay = ReviewRelay::new(Arc::new(generator));
        assert!(!relay.generator_available());
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.generator.default_model = "custom/model".to_string();
        config.generator.credential_prefix = "key-".to_string();

        let relay = ReviewRelay::from_config(&config, Some("key-1".to_string()));
        let job = relay.prepare(request("q")).unwrap();
        assert_eq!(job.model, "custom/model");
        assert_eq!(job.api_key, "key-1");
    }
}
