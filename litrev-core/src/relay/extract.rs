//! Locating the review payload in generator stdout

use serde::{Deserialize, Serialize};

/// How the generator marks its payload on stdout
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputContract {
    /// Everything from the first `{` to the last `}` after it
    #[default]
    Braces,

    /// The rest of the last line starting with `prefix`
    Sentinel { prefix: String },
}

impl OutputContract {
    /// Find the payload span in `stdout`, if any
    pub fn extract<'a>(&self, stdout: &'a str) -> Option<&'a str> {
        match self {
            OutputContract::Braces => brace_span(stdout),
            OutputContract::Sentinel { prefix } => sentinel_line(stdout, prefix),
        }
    }
}

/// Greedy `{ ... }` span, same as matching `\{[\s\S]*\}`
///
/// Unrelated braces before the real payload (e.g. a logged dict) widen the
/// span and usually make it unparseable.
fn brace_span(stdout: &str) -> Option<&str> {
    let start = stdout.find('{')?;
    let end = stdout.rfind('}')?;
    (end > start).then(|| &stdout[start..=end])
}

fn sentinel_line<'a>(stdout: &'a str, prefix: &str) -> Option<&'a str> {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(prefix))
        .map(str::trim)
        .filter(|payload| !payload.is_empty())
}
