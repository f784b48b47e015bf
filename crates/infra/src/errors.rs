//! Conversions from external infrastructure errors into domain errors.

use nudge_domain::NudgeError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub NudgeError);

impl From<InfraError> for NudgeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<NudgeError> for InfraError {
    fn from(value: NudgeError) -> Self {
        InfraError(value)
    }
}

impl From<HttpError> for InfraError {
    fn from(err: HttpError) -> Self {
        if err.is_timeout() {
            return InfraError(NudgeError::Network("HTTP request timed out".into()));
        }

        if err.is_connect() {
            return InfraError(NudgeError::Network("HTTP connection failure".into()));
        }

        if let Some(status) = err.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return InfraError(match code {
                401 | 403 => NudgeError::Auth(message),
                404 => NudgeError::NotFound(message),
                400..=499 => NudgeError::InvalidInput(message),
                _ => NudgeError::Network(message),
            });
        }

        InfraError(NudgeError::Network(format!("HTTP error: {err}")))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(err: serde_json::Error) -> Self {
        InfraError(NudgeError::InvalidInput(format!("JSON error: {err}")))
    }
}
