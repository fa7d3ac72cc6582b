//! Literature review payload types
//!
//! These mirror the JSON the generator prints. The relay never decodes into
//! them; they exist so clients can render a review. Decoding never fails on
//! field shape: missing, null or wrong-typed fields fall back to defaults so
//! a malformed payload shows up as gaps in the rendering.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::lenient;

/// Confidence tag attached to an article summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        };
        f.write_str(s)
    }
}

impl<'de> Deserialize<'de> for Confidence {
    /// Case-insensitive; unknown or non-text values read as `Medium`
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let confidence = match Value::deserialize(deserializer)? {
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "low" => Confidence::Low,
                "high" => Confidence::High,
                _ => Confidence::Medium,
            },
            _ => Confidence::Medium,
        };
        Ok(confidence)
    }
}

/// One summarized research article
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Article {
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::strings")]
    pub authors: Vec<String>,
    #[serde(deserialize_with = "lenient::year")]
    pub publication_year: i32,
    #[serde(deserialize_with = "lenient::string")]
    pub venue: String,
    #[serde(
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub doi: Option<String>,
    #[serde(rename = "abstract", deserialize_with = "lenient::string")]
    pub abstract_text: String,
    #[serde(deserialize_with = "lenient::strings")]
    pub keywords: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub research_goal: String,
    #[serde(deserialize_with = "lenient::string")]
    pub methodology: String,
    #[serde(deserialize_with = "lenient::string")]
    pub main_results: String,
    #[serde(deserialize_with = "lenient::string")]
    pub key_contributions: String,
    #[serde(deserialize_with = "lenient::string")]
    pub limitations: String,
    pub confidence: Confidence,
    #[serde(deserialize_with = "lenient::string")]
    pub source: String,
}

/// Field-level synthesis across all articles
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Synthesis {
    #[serde(deserialize_with = "lenient::string")]
    pub field_overview: String,
    #[serde(deserialize_with = "lenient::string")]
    pub gaps_and_challenges: String,
    #[serde(deserialize_with = "lenient::string")]
    pub future_directions: String,
}

/// Complete review as produced by the generator
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewResponse {
    /// Articles in generator order; non-object entries are skipped
    #[serde(deserialize_with = "lenient::items")]
    pub articles: Vec<Article>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub synthesis: Synthesis,
}

/// Error body returned by the review endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
