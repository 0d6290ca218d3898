use thiserror::Error;

/// Errors from the prediction and recommendation endpoints.
///
/// Stores rendered messages rather than `reqwest::Error` so results can be
/// cloned into UI messages.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// Nothing to upload; no request was made
    #[error("please select an image first")]
    Validation,

    /// Connection refused, timeout, broken transfer
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response. `message` is the `error` field of a JSON error
    /// body when the server sent one, else the raw body text.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// 2xx response whose body is not what we expected
    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid endpoint URL {0}")]
    Url(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Server { status: 404, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
