//! Account pool with validation at startup and random selection
//!
//! The pool is built once from the configured tokens. Every token is either
//! probed successfully or replaced by a freshly provisioned account; tokens
//! that can be neither are logged and dropped, never kept. After
//! construction the account list is read-only, so selection needs no lock.

use std::sync::Arc;

use rand::RngExt;
use telegraph::{AccessToken, AccountProfile, Page, PageArgs, TelegraphApi};
use tracing::{info, warn};

use crate::account::{AccountLimits, RateLimitedAccount};
use crate::error::{Error, Result};

/// Validated set of Telegraph accounts.
pub struct AccountPool {
    accounts: Vec<RateLimitedAccount>,
}

impl AccountPool {
    /// Validate or provision one account per token.
    ///
    /// A token is replaced by a new account when it does not look like a
    /// Telegraph token or its `getAccountInfo` probe fails. When provisioning
    /// fails as well, the entry is dropped and construction carries on.
    pub async fn connect(
        api: Arc<dyn TelegraphApi>,
        tokens: &[String],
        profile: AccountProfile,
        limits: AccountLimits,
    ) -> Self {
        let profile = Arc::new(profile);
        let mut accounts = Vec::with_capacity(tokens.len());

        for (id, raw) in tokens.iter().enumerate() {
            let token = AccessToken::new(raw.trim());
            let plausible = token.is_plausible();
            let account =
                RateLimitedAccount::new(id, token, api.clone(), profile.clone(), limits);

            let usable = if !plausible {
                warn!(account = id, "telegraph token looks invalid, creating an account instead");
                false
            } else {
                match account.validate().await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(account = id, error = %e, "telegraph token rejected, creating an account instead");
                        false
                    }
                }
            };

            if !usable {
                if let Err(e) = account.rotate().await {
                    warn!(account = id, error = %e, "cannot set up telegraph account, dropping it");
                    continue;
                }
                info!(account = id, "created replacement telegraph account");
            }

            accounts.push(account);
        }

        info!(
            configured = tokens.len(),
            accounts = accounts.len(),
            "telegraph pool initialized"
        );
        Self { accounts }
    }

    /// Build a pool from accounts that are already known to be usable.
    pub fn from_accounts(accounts: Vec<RateLimitedAccount>) -> Self {
        Self { accounts }
    }

    /// Pool with no accounts; every publish fails with `NotConfigured`.
    pub fn empty() -> Self {
        Self {
            accounts: Vec::new(),
        }
    }

    /// Whether at least one account survived construction.
    pub fn valid(&self) -> bool {
        !self.accounts.is_empty()
    }

    pub fn count(&self) -> usize {
        self.accounts.len()
    }

    pub fn accounts(&self) -> &[RateLimitedAccount] {
        &self.accounts
    }

    /// Pick an account uniformly at random.
    pub fn choose(&self) -> Result<&RateLimitedAccount> {
        if self.accounts.is_empty() {
            return Err(Error::NotConfigured);
        }
        let index = rand::rng().random_range(0..self.accounts.len());
        Ok(&self.accounts[index])
    }

    /// Create a page on a randomly chosen account.
    ///
    /// There is no affinity between calls: consecutive pages may land on
    /// different accounts.
    pub async fn create_page(&self, args: &PageArgs) -> Result<Page> {
        let account = self.choose()?;
        account.create_page(args).await
    }
}
