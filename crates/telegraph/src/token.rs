//! Access token wrapper
//!
//! Telegraph access tokens are bearer credentials: anyone holding one can
//! publish as that account. The wrapper keeps them out of logs and wipes the
//! memory on drop.

use std::fmt;
use zeroize::Zeroize;

/// Length of every access token Telegraph hands out.
pub const TOKEN_LEN: usize = 60;

/// Telegraph access token - redacted in Debug/Display
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Expose the raw token for an API call
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token has the shape of a real Telegraph token.
    ///
    /// Only the length is checked; a plausible token can still be revoked.
    pub fn is_plausible(&self) -> bool {
        self.0.len() == TOKEN_LEN
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken([REDACTED])")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Drop for AccessToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
