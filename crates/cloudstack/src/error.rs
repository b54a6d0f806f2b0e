//! Error types for the CloudStack API client.

use thiserror::Error;

/// Result type alias using the CloudStack client error.
pub type Result<T> = std::result::Result<T, Error>;

/// CloudStack client error types.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed response envelope")]
    BadEnvelope,

    #[error("CloudStack API error {error_code} (CSExceptionErrorCode: {cs_error_code}): {error_text}")]
    Api {
        error_code: i32,
        cs_error_code: i32,
        error_text: String,
    },

    #[error("no match found for {0}")]
    NotFound(String),

    #[error("more than one match found for {0}")]
    Ambiguous(String),

    #[error("async job {job_id} failed: {error_text}")]
    JobFailed { job_id: String, error_text: String },

    #[error("timeout waiting for async job {0}")]
    JobTimeout(String),
}

impl Error {
    /// True when a lookup came back with zero matches.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// True when the error means the entity behind `id` is already gone.
    ///
    /// The server reports operations on a deleted entity with this exact
    /// message, so ID lookups and deletes have to match on it.
    pub fn is_entity_gone(&self, id: &str) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Api { error_text, .. } | Error::JobFailed { error_text, .. } => error_text
                .contains(&format!(
                    "Invalid parameter id value={id} due to incorrect long value format, \
                     or entity does not exist"
                )),
            _ => false,
        }
    }

    /// The server-side error text, if this error carries one.
    pub fn api_error_text(&self) -> Option<&str> {
        match self {
            Error::Api { error_text, .. } | Error::JobFailed { error_text, .. } => {
                Some(error_text)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_gone_matches_id_in_error_text() {
        let err = Error::Api {
            error_code: 431,
            cs_error_code: 9999,
            error_text: "Invalid parameter id value=42-abc due to incorrect long value format, \
                         or entity does not exist"
                .to_string(),
        };
        assert!(err.is_entity_gone("42-abc"));
        assert!(!err.is_entity_gone("some-other-id"));
    }

    #[test]
    fn not_found_is_always_gone() {
        let err = Error::NotFound("vpc x".to_string());
        assert!(err.is_not_found());
        assert!(err.is_entity_gone("whatever"));
    }

    #[test]
    fn transport_errors_are_not_gone() {
        let err = Error::BadEnvelope;
        assert!(!err.is_entity_gone("id"));
        assert!(!err.is_not_found());
    }
}
