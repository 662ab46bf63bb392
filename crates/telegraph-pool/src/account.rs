//! Rate-limited wrapper around a single Telegraph account
//!
//! Three independent primitives guard each account:
//! - `call` (Mutex): one `createPage` in flight, spaced by `min_interval`
//! - `gate` (RwLock): normal calls read, flood recovery writes, so nothing
//!   reaches Telegraph on this account while it sleeps or rotates
//! - `recovering` (AtomicBool): claimed without blocking by the one caller
//!   that handles the current flood event; everyone else just retries and
//!   queues behind the write lock
//!
//! The retry counter is per account, not per call: any success resets it,
//! and reaching `max_attempts` flood rejections in a row yields `Overflow`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use telegraph::{AccessToken, AccountProfile, Page, PageArgs, TelegraphApi};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::flood::{self, Recovery};

/// Throttling and retry limits for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountLimits {
    /// Minimum spacing between the starts of two calls on the same account
    pub min_interval: Duration,
    /// Flood rejections in a row before giving up with `Overflow`
    pub max_attempts: u32,
    /// Flood waits at least this long rotate the account instead of sleeping
    pub rotate_after: Duration,
}

impl Default for AccountLimits {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
            max_attempts: 3,
            rotate_after: Duration::from_secs(60),
        }
    }
}

/// Mutable per-call state, only touched under the `call` mutex.
struct CallState {
    token: AccessToken,
    /// Start of the last successful call
    last_call: Option<Instant>,
}

/// Releases the recovery claim on every exit path.
struct RecoveryClaim<'a>(&'a AtomicBool);

impl<'a> RecoveryClaim<'a> {
    fn try_claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RecoveryClaim<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One Telegraph account with throttling and flood-control recovery.
pub struct RateLimitedAccount {
    id: usize,
    api: Arc<dyn TelegraphApi>,
    profile: Arc<AccountProfile>,
    limits: AccountLimits,
    call: Mutex<CallState>,
    gate: RwLock<()>,
    recovering: AtomicBool,
    retries: AtomicU32,
}

impl RateLimitedAccount {
    /// Wrap `token`. `id` only identifies the account in logs.
    pub fn new(
        id: usize,
        token: AccessToken,
        api: Arc<dyn TelegraphApi>,
        profile: Arc<AccountProfile>,
        limits: AccountLimits,
    ) -> Self {
        Self {
            id,
            api,
            profile,
            limits,
            call: Mutex::new(CallState {
                token,
                last_call: None,
            }),
            gate: RwLock::new(()),
            recovering: AtomicBool::new(false),
            retries: AtomicU32::new(0),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Flood rejections since the last success.
    pub fn retries(&self) -> u32 {
        self.retries.load(Ordering::Acquire)
    }

    /// Snapshot of the credential currently bound to this account.
    pub async fn token(&self) -> AccessToken {
        self.call.lock().await.token.clone()
    }

    /// Probe the current credential with `getAccountInfo`.
    pub async fn validate(&self) -> telegraph::Result<()> {
        let token = self.token().await;
        self.api.get_account_info(&token).await.map(|_| ())
    }

    /// Replace the credential with a freshly provisioned account.
    ///
    /// The account object keeps its identity, limits and call history; only
    /// the token changes. On failure the old token stays in place.
    pub async fn rotate(&self) -> telegraph::Result<()> {
        let token = self.api.create_account(&self.profile).await?;
        self.call.lock().await.token = token;
        metrics::counter!("telegraph_account_rotations_total").increment(1);
        Ok(())
    }

    /// Create a page, hiding throttling and flood control from the caller.
    ///
    /// Flood rejections are retried (sleeping or rotating in between) until
    /// `max_attempts` is reached, which fails with `Overflow` and resets the
    /// counter. Any other API error is returned as-is without retry.
    ///
    /// The shared counter can be reset by another caller's overflow, so each
    /// call also counts its own attempts and stops at `max_attempts` either
    /// way.
    pub async fn create_page(&self, args: &PageArgs) -> Result<Page> {
        let mut own_attempts = 0u32;
        loop {
            let retries = self.retries();
            if retries > 0 {
                info!(account = self.id, attempt = retries + 1, "retrying page creation");
            }

            match self.throttled_call(args).await {
                Ok(page) => {
                    self.retries.store(0, Ordering::Release);
                    return Ok(page);
                }
                Err(telegraph::Error::FloodWait(wait_secs)) => {
                    metrics::counter!("telegraph_flood_waits_total").increment(1);
                    warn!(
                        account = self.id,
                        retry_after_secs = wait_secs,
                        "flood control exceeded"
                    );

                    own_attempts += 1;
                    let shared = self.retries.fetch_add(1, Ordering::AcqRel) + 1;
                    let attempts = shared.max(own_attempts);
                    if attempts >= self.limits.max_attempts {
                        self.retries.store(0, Ordering::Release);
                        metrics::counter!("telegraph_overflows_total").increment(1);
                        warn!(account = self.id, attempts, "flood control persists, giving up");
                        return Err(Error::Overflow { attempts });
                    }

                    // A failed rotation ends this chain; the next call starts fresh.
                    if let Err(e) = self.recover(wait_secs).await {
                        self.retries.store(0, Ordering::Release);
                        return Err(e);
                    }
                }
                Err(e) => return Err(Error::Api(e)),
            }
        }
    }

    /// One real network call: wait out the minimum interval, then call
    /// Telegraph while holding the account's call lock.
    async fn throttled_call(&self, args: &PageArgs) -> telegraph::Result<Page> {
        let _normal = self.gate.read().await;
        let mut state = self.call.lock().await;

        if let Some(last) = state.last_call {
            tokio::time::sleep_until(last + self.limits.min_interval).await;
        }

        let started = Instant::now();
        let page = self.api.create_page(&state.token, args).await?;
        state.last_call = Some(started);
        Ok(page)
    }

    /// Sleep off or rotate away from a flood wait, unless another caller is
    /// already doing so for this account.
    async fn recover(&self, wait_secs: u64) -> Result<()> {
        let Some(_claim) = RecoveryClaim::try_claim(&self.recovering) else {
            debug!(account = self.id, "flood recovery already in progress");
            return Ok(());
        };

        // Waits for in-flight calls to drain and holds back new ones.
        let _exclusive = self.gate.write().await;

        match flood::plan(wait_secs, self.limits.rotate_after) {
            Recovery::Rotate => {
                self.rotate().await?;
                warn!(
                    account = self.id,
                    retry_after_secs = wait_secs,
                    "flood wait too long, switched to a newly created telegraph account"
                );
            }
            Recovery::Sleep(duration) => {
                tokio::time::sleep(duration).await;
            }
        }
        Ok(())
    }
}
