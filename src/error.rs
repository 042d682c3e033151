use thiserror::Error;

/// Failure to obtain words from a remote generator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SupplyError {
    /// The generator rejected the call because the minimum interval had not elapsed
    #[error("word generation rate limited")]
    RateLimited,

    #[error("word generation failed with status {0}")]
    Status(u16),

    #[error("word generation transport error: {0}")]
    Transport(String),

    #[error("malformed word list: {0}")]
    Malformed(String),
}

/// Failure loading an embedded word pool
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("word pool file not found: {0}")]
    Missing(String),

    #[error("word pool {0} is not valid utf-8")]
    Encoding(String),

    #[error("unable to deserialize word pool: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("word pool {0} has no words")]
    Empty(String),
}

/// Rejected score submission
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LeaderboardError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

/// Failure talking to the typing server
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("rate limited by server")]
    RateLimited,

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid server url: {0}")]
    Url(String),
}

impl From<ApiError> for SupplyError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::RateLimited => SupplyError::RateLimited,
            ApiError::Status(code) => SupplyError::Status(code),
            ApiError::Transport(e) => SupplyError::Transport(e.to_string()),
            ApiError::Decode(msg) => SupplyError::Malformed(msg),
            ApiError::Url(msg) => SupplyError::Transport(msg),
        }
    }
}
