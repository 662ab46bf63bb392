//! Scripted in-memory Telegraph API for tests

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use telegraph::{AccessToken, AccountInfo, AccountProfile, Page, PageArgs, TelegraphApi};
use tokio::time::Instant;

/// One observed `createPage` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub token: String,
    pub title: String,
    pub at: Instant,
}

/// Answers `createPage` from a queue of scripted results (success once the
/// queue is empty) and records every call with its start time.
#[derive(Default)]
pub struct ScriptedApi {
    page_results: Mutex<VecDeque<telegraph::Result<Page>>>,
    calls: Mutex<Vec<RecordedCall>>,
    rejected_tokens: HashSet<String>,
    provision_fails: AtomicBool,
    provision_delay: Duration,
    provisioned: AtomicUsize,
    probes: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens whose `getAccountInfo` probe fails.
    pub fn rejecting(mut self, tokens: &[&str]) -> Self {
        self.rejected_tokens = tokens.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn failing_provisioning(self) -> Self {
        self.provision_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Make every `createAccount` take this long.
    pub fn with_provision_delay(mut self, delay: Duration) -> Self {
        self.provision_delay = delay;
        self
    }

    pub fn push_page_result(&self, result: telegraph::Result<Page>) {
        self.page_results.lock().unwrap().push_back(result);
    }

    pub fn push_floods(&self, wait_secs: u64, times: usize) {
        for _ in 0..times {
            self.push_page_result(Err(telegraph::Error::FloodWait(wait_secs)));
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn provisioned(&self) -> usize {
        self.provisioned.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

/// Page returned for a successful scripted call.
pub fn page_for(token: &str) -> Page {
    Page {
        path: format!("{token}-page"),
        url: format!("https://telegra.ph/{token}-page"),
        title: "Title".into(),
        description: String::new(),
        author_name: None,
        author_url: None,
        views: 0,
    }
}

pub fn sample_args() -> PageArgs {
    PageArgs {
        title: "Title".into(),
        html_content: "<p>Body</p>".into(),
        author_name: "Author".into(),
        author_url: String::new(),
    }
}

/// A token that passes the length check.
pub fn plausible_token(tag: char) -> String {
    tag.to_string().repeat(telegraph::TOKEN_LEN)
}

impl TelegraphApi for ScriptedApi {
    fn get_account_info<'a>(
        &'a self,
        token: &'a AccessToken,
    ) -> Pin<Box<dyn Future<Output = telegraph::Result<AccountInfo>> + Send + 'a>> {
        Box::pin(async move {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.rejected_tokens.contains(token.expose()) {
                return Err(telegraph::Error::Api("ACCESS_TOKEN_INVALID".into()));
            }
            Ok(AccountInfo {
                short_name: "test".into(),
                author_name: String::new(),
                author_url: String::new(),
                access_token: None,
                page_count: None,
            })
        })
    }

    fn create_account<'a>(
        &'a self,
        _profile: &'a AccountProfile,
    ) -> Pin<Box<dyn Future<Output = telegraph::Result<AccessToken>> + Send + 'a>> {
        Box::pin(async move {
            if !self.provision_delay.is_zero() {
                tokio::time::sleep(self.provision_delay).await;
            }
            if self.provision_fails.load(Ordering::SeqCst) {
                return Err(telegraph::Error::Api("CREATE_ACCOUNT_FAILED".into()));
            }
            let n = self.provisioned.fetch_add(1, Ordering::SeqCst);
            Ok(AccessToken::new(format!("provisioned-{n}")))
        })
    }

    fn create_page<'a>(
        &'a self,
        token: &'a AccessToken,
        page: &'a PageArgs,
    ) -> Pin<Box<dyn Future<Output = telegraph::Result<Page>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(RecordedCall {
                token: token.expose().to_string(),
                title: page.title.clone(),
                at: Instant::now(),
            });
            let scripted = self.page_results.lock().unwrap().pop_front();
            scripted.unwrap_or_else(|| Ok(page_for(token.expose())))
        })
    }
}
