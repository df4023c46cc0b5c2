use dealerdash_core::error::CoreError;

/// Fallback shown when the backend gives no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong, please try again";

/// Errors from the dashboard REST client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A domain-level error (validation, data shape, permissions, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or [`GENERIC_ERROR_MESSAGE`].
        message: String,
    },

    /// A 2xx body that could not be decoded into the expected type.
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// The request was cancelled before it completed.
    #[error("Request cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Message to show in an error toast.
    pub fn toast_message(&self) -> String {
        match self {
            Self::Core(core) => core.user_message(),
            Self::Api { message, .. } => message.clone(),
            Self::Request(err) if err.is_timeout() => "The server took too long to respond".into(),
            Self::Request(_) | Self::Decode(_) | Self::Io(_) => GENERIC_ERROR_MESSAGE.to_string(),
            Self::Cancelled => "Request cancelled".into(),
        }
    }

    /// 401 from the backend or a missing session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
            || matches!(self, Self::Core(CoreError::Unauthorized(_)))
    }
}
