//! Publish layer: shapes article pieces into a page and publishes it
//!
//! `Publisher` is the caller the concurrency gate is meant for: it holds one
//! permit for the duration of a single pool call.

use std::sync::Arc;

use telegraph::{AccountProfile, PageArgs};
use tracing::debug;

use crate::error::{Error, Result};
use crate::gate::ConcurrencyGate;
use crate::pool::AccountPool;

/// Telegraph limits, in characters.
const MAX_TITLE_CHARS: usize = 256;
const MAX_AUTHOR_NAME_CHARS: usize = 128;
const MAX_AUTHOR_URL_CHARS: usize = 512;

/// Article pieces to be published as one Telegraph page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDraft {
    html: String,
    title: Option<String>,
    link: Option<String>,
    feed_title: Option<String>,
    author: Option<String>,
}

impl PageDraft {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Link to the original article; adds a source footer to the page.
    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn feed_title(mut self, feed_title: impl Into<String>) -> Self {
        self.feed_title = Some(feed_title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Build the `createPage` arguments.
    ///
    /// With a feed title the page is attributed to the feed (plus the article
    /// author when the feed title doesn't already name them) and links to the
    /// article; without one it falls back to `profile`.
    pub fn into_page_args(self, profile: &AccountProfile) -> PageArgs {
        let link = self.link.filter(|l| !l.is_empty());

        let (author_name, author_url) = match self.feed_title.filter(|f| !f.is_empty()) {
            Some(feed_title) => {
                let name = match self.author.filter(|a| !a.is_empty()) {
                    Some(author) if !feed_title.contains(&author) => {
                        format!("{feed_title} ({author})")
                    }
                    _ => feed_title,
                };
                (name, link.clone().unwrap_or_default())
            }
            None => (profile.author_name.clone(), profile.author_url.clone()),
        };

        let title = self
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| profile.author_name.clone());

        let html_content = match &link {
            Some(link) => format!("{}{}", self.html, attribution_footer(profile, link)),
            None => self.html,
        };

        PageArgs {
            title: truncate_chars(&title, MAX_TITLE_CHARS),
            html_content,
            author_name: truncate_chars(&author_name, MAX_AUTHOR_NAME_CHARS),
            author_url: truncate_chars(&author_url, MAX_AUTHOR_URL_CHARS),
        }
    }
}

fn attribution_footer(profile: &AccountProfile, link: &str) -> String {
    let generator = if profile.author_url.is_empty() {
        escape_html(&profile.author_name)
    } else {
        format!(
            "<a href=\"{}\">{}</a>",
            escape_html(&profile.author_url),
            escape_html(&profile.author_name)
        )
    };
    format!(
        "<br><br>Published by {generator}. The copyright belongs to the source site.\
         <br><br><a href=\"{}\">Source</a>",
        escape_html(link)
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Publishes drafts through the gate and the pool.
pub struct Publisher {
    pool: Arc<AccountPool>,
    gate: ConcurrencyGate,
    profile: AccountProfile,
}

impl Publisher {
    pub fn new(pool: Arc<AccountPool>, gate: ConcurrencyGate, profile: AccountProfile) -> Self {
        Self {
            pool,
            gate,
            profile,
        }
    }

    pub fn pool(&self) -> &AccountPool {
        &self.pool
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Publish `draft` and return the public URL of the new page.
    ///
    /// Fails fast with `NotConfigured` when the pool has no accounts, before
    /// taking a permit.
    pub async fn publish(&self, draft: PageDraft) -> Result<String> {
        if !self.pool.valid() {
            return Err(Error::NotConfigured);
        }

        let args = draft.into_page_args(&self.profile);
        let page = self
            .gate
            .with_permit(|| self.pool.create_page(&args))
            .await?;
        debug!(url = %page.url, "page published");
        Ok(page.url)
    }
}
