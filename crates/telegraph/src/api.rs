//! The remote API seen by the pool

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::token::AccessToken;
use crate::types::{AccountInfo, AccountProfile, Page, PageArgs};

/// Abstraction over the Telegraph publishing API.
///
/// The token is passed per call rather than bound to the client, so an
/// account can swap its credential after rotation while sharing one
/// connection pool with every other account.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn TelegraphApi>`).
pub trait TelegraphApi: Send + Sync {
    /// Probe an existing account. Fails when the token is revoked or unknown.
    fn get_account_info<'a>(
        &'a self,
        token: &'a AccessToken,
    ) -> Pin<Box<dyn Future<Output = Result<AccountInfo>> + Send + 'a>>;

    /// Provision a brand-new account and return its access token.
    fn create_account<'a>(
        &'a self,
        profile: &'a AccountProfile,
    ) -> Pin<Box<dyn Future<Output = Result<AccessToken>> + Send + 'a>>;

    /// Publish a page as the account owning `token`.
    fn create_page<'a>(
        &'a self,
        token: &'a AccessToken,
        page: &'a PageArgs,
    ) -> Pin<Box<dyn Future<Output = Result<Page>> + Send + 'a>>;
}
