//! reqwest-backed Telegraph client
//!
//! Every Telegraph method is a form POST to `{api_url}/{method}` answering
//! with `{"ok": bool, "result": ..., "error": "..."}`. Failed envelopes are
//! mapped through `Error::from_api_message`, so flood control surfaces as
//! `Error::FloodWait`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::TelegraphApi;
use crate::error::{Error, Result};
use crate::nodes::html_to_nodes;
use crate::token::AccessToken;
use crate::types::{AccountInfo, AccountProfile, Page, PageArgs};

/// Public Telegraph API endpoint
pub const DEFAULT_API_URL: &str = "https://api.telegra.ph";

/// Connection settings for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Optional upstream proxy applied to every request (http, https or socks URL)
    pub proxy: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            proxy: None,
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    error: Option<String>,
}

/// Telegraph client shared by every account in the pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    api_url: String,
}

impl HttpClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .read_timeout(options.read_timeout);

        if let Some(proxy) = &options.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| Error::Http(format!("invalid proxy {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: options.api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, form: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{method}", self.api_url);
        let response = retry_once(
            || self.client.post(&url).form(form).send(),
            |e: &reqwest::Error| {
                let connect = e.is_connect();
                if connect {
                    debug!(method, error = %e, "connection failed, retrying once");
                }
                connect
            },
        )
        .await
        .map_err(|e| Error::Http(format!("{method} request failed: {e}")))?;

        let status = response.status();
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| Error::Decode(format!("{method} returned {status}: {e}")))?;

        if envelope.ok {
            envelope
                .result
                .ok_or_else(|| Error::Decode(format!("{method} returned ok without a result")))
        } else {
            let message = envelope.error.unwrap_or_else(|| "unknown error".into());
            debug!(method, error = %message, "telegraph rejected request");
            Err(Error::from_api_message(&message))
        }
    }
}

/// Run `attempt`, and run it once more when the first failure is `retryable`.
async fn retry_once<T, E, F, Fut>(
    mut attempt: F,
    retryable: impl Fn(&E) -> bool,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    match attempt().await {
        Err(e) if retryable(&e) => attempt().await,
        other => other,
    }
}

impl TelegraphApi for HttpClient {
    fn get_account_info<'a>(
        &'a self,
        token: &'a AccessToken,
    ) -> Pin<Box<dyn Future<Output = Result<AccountInfo>> + Send + 'a>> {
        Box::pin(async move {
            self.call("getAccountInfo", &[("access_token", token.expose())])
                .await
        })
    }

    fn create_account<'a>(
        &'a self,
        profile: &'a AccountProfile,
    ) -> Pin<Box<dyn Future<Output = Result<AccessToken>> + Send + 'a>> {
        Box::pin(async move {
            let info: AccountInfo = self
                .call(
                    "createAccount",
                    &[
                        ("short_name", profile.short_name.as_str()),
                        ("author_name", profile.author_name.as_str()),
                        ("author_url", profile.author_url.as_str()),
                    ],
                )
                .await?;
            info.access_token
                .map(AccessToken::new)
                .ok_or_else(|| Error::Decode("createAccount returned no access_token".into()))
        })
    }

    fn create_page<'a>(
        &'a self,
        token: &'a AccessToken,
        page: &'a PageArgs,
    ) -> Pin<Box<dyn Future<Output = Result<Page>> + Send + 'a>> {
        Box::pin(async move {
            let content = serde_json::to_string(&html_to_nodes(&page.html_content))
                .map_err(|e| Error::Decode(format!("failed to encode page content: {e}")))?;
            self.call(
                "createPage",
                &[
                    ("access_token", token.expose()),
                    ("title", page.title.as_str()),
                    ("author_name", page.author_name.as_str()),
                    ("author_url", page.author_url.as_str()),
                    ("content", content.as_str()),
                    ("return_content", "false"),
                ],
            )
            .await
        })
    }
}
