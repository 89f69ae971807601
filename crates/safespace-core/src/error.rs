//! Error types for SafeSpace

/// Result type alias using SafeSpace's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for SafeSpace operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No credentials configured for the remote service
    #[error("remote service unavailable: no credentials configured")]
    RemoteUnavailable,

    /// The remote round trip exceeded its timeout and was abandoned
    #[error("remote call timed out after {0:?}")]
    RemoteTimeout(std::time::Duration),

    /// Connection or HTTP failure talking to the remote service
    #[error("remote transport error: {0}")]
    RemoteTransport(String),

    /// The remote reply did not match the expected wire format
    #[error("remote reply could not be parsed: {0}")]
    RemoteParse(String),

    /// A rewrite reply failed validation
    #[error("rewrite rejected: {0}")]
    RewriteRejected(String),

    /// The batch was cancelled before this remote call was dispatched
    #[error("dispatch cancelled")]
    Cancelled,

    /// Persisted cache could not be read
    #[error("cache load error: {0}")]
    CacheLoad(String),

    /// Persisted cache could not be written
    #[error("cache write error: {0}")]
    CacheWrite(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Batch input violated its contract
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::RemoteTransport(msg.into())
    }

    /// Create a new reply parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::RemoteParse(msg.into())
    }

    /// Create a new rewrite rejection
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::RewriteRejected(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error belongs to the remote family.
    ///
    /// Remote errors are absorbed at the classifier and rewriter boundary and
    /// turned into an absent result.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable
                | Self::RemoteTimeout(_)
                | Self::RemoteTransport(_)
                | Self::RemoteParse(_)
                | Self::RewriteRejected(_)
                | Self::Cancelled
        )
    }
}
