//! Review request parsing and validation

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// A request for a literature review
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    /// Research query, never empty
    pub query: String,

    /// Credential override for the generation provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ReviewRequest {
    /// Create a request for `query`, validating it
    pub fn new(query: impl Into<String>) -> Result<Self> {
        let query = query.into();
        validate_query(&query)?;
        Ok(Self {
            query,
            api_key: None,
            model: None,
        })
    }

    /// Attach a credential override
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Attach a model override
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Parse a raw HTTP body
    ///
    /// Any shape problem becomes `Error::InvalidInput` so callers see the
    /// same error contract whether the body is broken JSON or just lacks
    /// a query.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Error::InvalidInput(format!("Invalid request body: {}", e)))?;
        Self::from_value(value)
    }

    /// Build a request from an already-decoded JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(Error::InvalidInput(
                "Invalid request body: expected a JSON object".to_string(),
            ));
        };

        let query = match fields.remove("query") {
            Some(Value::String(q)) if !q.trim().is_empty() => q,
            _ => return Err(Error::InvalidInput("Invalid query parameter".to_string())),
        };

        Ok(Self {
            query,
            api_key: optional_string(&mut fields, "apiKey")?,
            model: optional_string(&mut fields, "model")?,
        })
    }
}

fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::InvalidInput("Invalid query parameter".to_string()));
    }
    Ok(())
}

fn optional_string(fields: &mut Map<String, Value>, key: &str) -> Result<Option<String>> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(Error::InvalidInput(format!(
            "Invalid {} parameter: expected a string",
            key
        ))),
    }
}
