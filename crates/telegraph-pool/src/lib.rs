//! Rate-limited Telegraph account pool
//!
//! Spreads page creation across several Telegraph accounts so that no single
//! account trips flood control. Each account serializes its own calls and
//! keeps a minimum interval between them; when Telegraph still answers with
//! `FLOOD_WAIT_<n>`, the account either sleeps it off or provisions a fresh
//! credential, then retries.
//!
//! Request flow:
//! 1. `Publisher` shapes a `PageDraft` into `PageArgs`
//! 2. `ConcurrencyGate` admits the publish (capacity = pool size)
//! 3. `AccountPool` picks an account uniformly at random
//! 4. `RateLimitedAccount` throttles, calls Telegraph, recovers from flood control
//! 5. The page URL bubbles back to the caller

pub mod account;
pub mod error;
pub mod flood;
pub mod gate;
pub mod pool;
pub mod publish;

#[cfg(test)]
pub(crate) mod mock;

pub use account::{AccountLimits, RateLimitedAccount};
pub use error::{Error, Result};
pub use flood::Recovery;
pub use gate::{ConcurrencyGate, DEFAULT_CONCURRENCY};
pub use pool::AccountPool;
pub use publish::{PageDraft, Publisher};
