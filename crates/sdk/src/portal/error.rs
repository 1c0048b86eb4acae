use reqwest::StatusCode;

/// Bytes of an unexpected response body kept in [`RequestError::UnexpectedStatus`]
pub const MAX_ERROR_BODY_LEN: usize = 4096;

/// The ways a single portal request can fail. Exactly one applies per request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The request never produced a response: connection failure, timeout or
    /// an unusable URL.
    #[error("HTTP request failed: {detail}")]
    HttpError {
        detail: String,
        #[source]
        source: reqwest::Error,
    },
    /// The portal answered with a status the endpoint does not accept. `body`
    /// holds at most [`MAX_ERROR_BODY_LEN`] bytes of the response.
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },
    /// The body was not the JSON the endpoint expects.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    /// The body was not valid UTF-8 text.
    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

impl From<reqwest::Error> for RequestError {
    fn from(source: reqwest::Error) -> Self {
        let detail = if source.is_timeout() {
            "request timed out"
        } else if source.is_connect() {
            "could not connect to portal"
        } else if source.is_builder() {
            "invalid request"
        } else if source.is_body() || source.is_decode() {
            "failed to read response body"
        } else {
            "transport failure"
        };
        Self::HttpError {
            detail: detail.to_string(),
            source,
        }
    }
}

impl RequestError {
    /// The HTTP status, if the portal answered with an unexpected one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request failed because a timeout expired
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::HttpError { source, .. } if source.is_timeout())
    }
}
