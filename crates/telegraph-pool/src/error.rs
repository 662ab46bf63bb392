//! Error types for pool operations

/// Errors surfaced to callers of the pool.
///
/// Flood control never appears here directly: it is retried inside the
/// account until it either clears or turns into `Overflow`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("flood control retries exhausted after {attempts} attempts")]
    Overflow { attempts: u32 },

    #[error("telegraph is not configured: no usable accounts")]
    NotConfigured,

    #[error(transparent)]
    Api(#[from] telegraph::Error),

    #[error("concurrency gate closed")]
    GateClosed,
}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
