//! Flood-control recovery planning
//!
//! Telegraph tells a throttled account how long to wait. Short waits are
//! slept off (plus one second of slack); long waits are cheaper to dodge by
//! provisioning a new account than to sit through.

use std::time::Duration;

/// Slack added on top of the wait Telegraph asks for.
const SLEEP_SLACK: Duration = Duration::from_secs(1);

/// What an account does about a `FLOOD_WAIT_<n>` rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Block the account for this long, then retry with the same credential
    Sleep(Duration),
    /// Replace the credential with a freshly provisioned account, then retry
    Rotate,
}

/// Decide how to recover from a flood wait of `wait_secs` seconds.
///
/// Waits at or above `rotate_after` rotate the account; anything shorter
/// sleeps for the wait plus one second.
pub fn plan(wait_secs: u64, rotate_after: Duration) -> Recovery {
    let wait = Duration::from_secs(wait_secs);
    if wait >= rotate_after {
        Recovery::Rotate
    } else {
        Recovery::Sleep(wait + SLEEP_SLACK)
    }
}
