use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Sheet endpoint returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Sheet endpoint reported status '{0}'")]
    EndpointStatus(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Could not encode request: {0}")]
    EncodeError(#[source] serde_json::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
            format!("{}... (truncated, {} total bytes)", cut, body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::HttpStatus {
            status: status.as_u16(),
            body: Self::truncate_body(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_keeps_code() {
        let err = ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "Sheet endpoint returned HTTP 502: upstream down");
    }

    #[test]
    fn test_from_status_truncates_long_body() {
        let body = "x".repeat(2000);
        match ApiError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ApiError::HttpStatus { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("truncated, 2000 total bytes"));
                assert!(body.len() < 600);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_encode_error_is_not_a_response_error() {
        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err = ApiError::EncodeError(source);
        assert!(err.to_string().starts_with("Could not encode request: "));
        assert!(std::error::Error::source(&err).is_some());
    }
}
