//! Relay error to HTTP response mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use litrev_core::review::ErrorBody;
use litrev_core::Error;

/// A relay error on its way to the client
///
/// Only the human-readable message is sent; stderr, raw stdout and parser
/// details are logged here.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    /// HTTP status for the wrapped error
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidInput(_) | Error::InvalidCredentialFormat { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::GenerationTimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::MissingCredential
            | Error::ProcessSpawnFailed { .. }
            | Error::GenerationProcessFailed { .. }
            | Error::NoOutputProduced { .. }
            | Error::MalformedOutput { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::Http(_)
            | Error::Server { .. }
            | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if self.0.is_client_error() {
            tracing::warn!(status = status.as_u16(), "Rejected review request: {}", self.0);
        } else {
            tracing::error!(status = status.as_u16(), "Review request failed: {:?}", self.0);
        }

        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
