//! Request and response types exchanged with the Telegraph API

use serde::{Deserialize, Serialize};

/// Profile used when provisioning a fresh account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccountProfile {
    /// Account name, shown only to the account owner (1-32 chars)
    pub short_name: String,
    /// Default author name for new pages (0-128 chars)
    pub author_name: String,
    /// Default profile link for new pages (0-512 chars)
    pub author_url: String,
}

/// Account details returned by `getAccountInfo` and `createAccount`.
///
/// `access_token` is only present in the `createAccount` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub short_name: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_url: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub page_count: Option<u64>,
}

/// Arguments for a single `createPage` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageArgs {
    pub title: String,
    /// Page body as HTML; converted to Telegraph nodes on the wire
    pub html_content: String,
    pub author_name: String,
    pub author_url: String,
}

/// A published page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Page {
    pub path: String,
    /// Publicly reachable URL of the page
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_url: Option<String>,
    #[serde(default)]
    pub views: u64,
}
