//! Error types for Telegraph API operations

/// Prefix of the error string Telegraph returns when flood control kicks in,
/// e.g. `FLOOD_WAIT_7`.
const FLOOD_WAIT_PREFIX: &str = "FLOOD_WAIT_";

/// Errors from Telegraph API operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Flood control exceeded; the account must wait this many seconds.
    #[error("flood control exceeded, retry in {0}s")]
    FloodWait(u64),

    #[error("telegraph API error: {0}")]
    Api(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl Error {
    /// Build an error from the `error` string of a failed API envelope.
    ///
    /// Flood-control messages become `FloodWait`, anything else is kept
    /// verbatim as `Api`.
    pub fn from_api_message(message: &str) -> Self {
        match parse_flood_wait(message) {
            Some(secs) => Error::FloodWait(secs),
            None => Error::Api(message.to_string()),
        }
    }
}

/// Extract the wait duration from a `FLOOD_WAIT_<seconds>` message.
pub fn parse_flood_wait(message: &str) -> Option<u64> {
    message
        .strip_prefix(FLOOD_WAIT_PREFIX)?
        .rsplit('_')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Result alias for Telegraph operations.
pub type Result<T> = std::result::Result<T, Error>;
