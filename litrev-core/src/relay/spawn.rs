//! Generator subprocess handle and output collection

use std::process::ExitStatus;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Everything a finished generator left behind
#[derive(Debug)]
pub struct GeneratorOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Handle to a running generator process
pub struct GeneratorHandle {
    /// The child process (not Debug, so we skip it)
    child: Child,
    /// Program that was launched, for diagnostics
    program: String,
}

impl std::fmt::Debug for GeneratorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorHandle")
            .field("program", &self.program)
            .field("pid", &self.child.id())
            .field("child", &"<Child>")
            .finish()
    }
}

impl GeneratorHandle {
    /// Wrap a spawned child with piped stdout and stderr
    pub fn new(child: Child, program: impl Into<String>) -> Self {
        Self {
            child,
            program: program.into(),
        }
    }

    /// Read both streams to the end and wait for exit
    ///
    /// Streams are drained concurrently so a chatty stderr cannot block
    /// stdout. Buffers are unbounded.
    pub async fn collect(&mut self) -> Result<GeneratorOutput> {
        let stdout = self.child.stdout.take();
        let stderr = self.child.stderr.take();

        let (stdout, stderr) = tokio::try_join!(
            drain(stdout, "stdout"),
            drain(stderr, "stderr"),
        )?;

        let status = self.child.wait().await.map_err(Error::Io)?;
        debug!(program = %self.program, %status, "Generator exited");

        Ok(GeneratorOutput {
            status,
            stdout,
            stderr,
        })
    }

    /// Like [`collect`](Self::collect), but kill the child after `timeout`
    pub async fn collect_with_timeout(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<GeneratorOutput> {
        let Some(limit) = timeout else {
            return self.collect().await;
        };

        let outcome = tokio::time::timeout(limit, self.collect()).await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    program = %self.program,
                    pid = ?self.child.id(),
                    timeout_secs = limit.as_secs(),
                    "Generator timed out, killing"
                );
                self.kill().await?;
                Err(Error::GenerationTimedOut(limit))
            }
        }
    }

    /// Kill the generator process
    pub async fn kill(&mut self) -> Result<()> {
        self.child.kill().await.map_err(Error::Io)
    }
}

async fn drain<R>(stream: Option<R>, name: &'static str) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return Ok(String::new());
    };

    let mut reader = BufReader::new(stream);
    let mut collected = String::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_until(b'\n', &mut line)
            .await
            .map_err(Error::Io)?;

        if bytes_read == 0 {
            // EOF
            break;
        }

        let text = String::from_utf8_lossy(&line);
        debug!(stream = name, line = %text.trim_end(), "Generator output");
        collected.push_str(&text);
    }

    Ok(collected)
}
