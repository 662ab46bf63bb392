//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Telegraph tokens come from the TELEGRAPH_TOKEN env var or token_file and
//! are never read from the TOML itself.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use telegraph::{AccessToken, AccountProfile, ClientOptions};
use telegraph_pool::DEFAULT_CONCURRENCY;

use crate::error::{Error, Result};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub telegraph: TelegraphConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Telegraph client and account settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TelegraphConfig {
    pub api_url: String,
    pub proxy: Option<String>,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    /// Gate capacity when no account is usable.
    pub default_concurrency: usize,
    pub short_name: String,
    pub author_name: String,
    pub author_url: String,
    /// Path to a file with one token per line or comma-separated tokens
    /// (alternative to TELEGRAPH_TOKEN env var)
    pub token_file: Option<PathBuf>,
    #[serde(skip)]
    pub tokens: Vec<AccessToken>,
}

impl Default for TelegraphConfig {
    fn default() -> Self {
        Self {
            api_url: telegraph::client::DEFAULT_API_URL.to_string(),
            proxy: None,
            connect_timeout_secs: 5,
            read_timeout_secs: 5,
            default_concurrency: DEFAULT_CONCURRENCY,
            short_name: "publish-gateway".to_string(),
            author_name: "Generated by publish-gateway".to_string(),
            author_url: String::new(),
            token_file: None,
            tokens: Vec::new(),
        }
    }
}

impl TelegraphConfig {
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            api_url: self.api_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            proxy: self.proxy.clone(),
        }
    }

    /// Profile used for provisioned accounts and page attribution.
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            short_name: self.short_name.clone(),
            author_name: self.author_name.clone(),
            author_url: self.author_url.clone(),
        }
    }
}

fn default_max_connections() -> usize {
    1000
}

/// Split a token list on commas and newlines, dropping blank entries.
pub fn parse_token_list(raw: &str) -> Vec<AccessToken> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(AccessToken::new)
        .collect()
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Token resolution order:
    /// 1. TELEGRAPH_TOKEN env var
    /// 2. token_file path from config
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.validate()?;

        if let Ok(proxy) = std::env::var("TELEGRAPH_PROXY") {
            let proxy = proxy.trim();
            config.telegraph.proxy = (!proxy.is_empty()).then(|| proxy.to_owned());
        }

        if let Ok(raw) = std::env::var("TELEGRAPH_TOKEN") {
            config.telegraph.tokens = parse_token_list(&raw);
        } else if let Some(ref token_file) = config.telegraph.token_file {
            let raw = std::fs::read_to_string(token_file).map_err(|e| {
                Error::Config(format!(
                    "failed to read token_file {}: {e}",
                    token_file.display()
                ))
            })?;
            config.telegraph.tokens = parse_token_list(&raw);
        }

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let telegraph = &self.telegraph;

        if !telegraph.api_url.starts_with("http://") && !telegraph.api_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "api_url must start with http:// or https://, got: {}",
                telegraph.api_url
            )));
        }

        if telegraph.connect_timeout_secs == 0 {
            return Err(Error::Config(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }

        if telegraph.read_timeout_secs == 0 {
            return Err(Error::Config(
                "read_timeout_secs must be greater than 0".into(),
            ));
        }

        if telegraph.default_concurrency == 0 {
            return Err(Error::Config(
                "default_concurrency must be greater than 0".into(),
            ));
        }

        if self.server.max_connections == 0 {
            return Err(Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("publish-gateway.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that mutate environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn clear_env() {
        unsafe {
            remove_env("TELEGRAPH_TOKEN");
            remove_env("TELEGRAPH_PROXY");
        }
    }

    fn minimal_toml() -> &'static str {
        r#"
[server]
listen_addr = "127.0.0.1:8080"
"#
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, minimal_toml());

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert_eq!(config.server.max_connections, 1000);
        assert_eq!(config.telegraph.api_url, "https://api.telegra.ph");
        assert_eq!(config.telegraph.connect_timeout_secs, 5);
        assert_eq!(config.telegraph.read_timeout_secs, 5);
        assert_eq!(config.telegraph.default_concurrency, 10);
        assert!(config.telegraph.proxy.is_none());
        assert!(config.telegraph.tokens.is_empty());
    }

    #[test]
    fn test_load_full_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[server]
listen_addr = "0.0.0.0:9000"
max_connections = 50

[telegraph]
api_url = "http://127.0.0.1:8081"
proxy = "socks5://127.0.0.1:1080"
connect_timeout_secs = 2
read_timeout_secs = 10
default_concurrency = 4
short_name = "feeds"
author_name = "Feed Mirror"
author_url = "https://example.org"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.max_connections, 50);
        let options = config.telegraph.client_options();
        assert_eq!(options.api_url, "http://127.0.0.1:8081");
        assert_eq!(options.connect_timeout, Duration::from_secs(2));
        assert_eq!(options.read_timeout, Duration::from_secs(10));
        assert_eq!(options.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
        assert_eq!(config.telegraph.default_concurrency, 4);
        let profile = config.telegraph.profile();
        assert_eq!(profile.short_name, "feeds");
        assert_eq!(profile.author_name, "Feed Mirror");
        assert_eq!(profile.author_url, "https://example.org");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");

        let result = Config::load(&path);
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_rejects_non_http_api_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[server]
listen_addr = "127.0.0.1:8080"

[telegraph]
api_url = "ftp://api.telegra.ph"
"#,
        );

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("api_url"), "got: {err}");
    }

    #[test]
    fn test_rejects_zero_values() {
        let cases = [
            ("[telegraph]\nconnect_timeout_secs = 0", "connect_timeout_secs"),
            ("[telegraph]\nread_timeout_secs = 0", "read_timeout_secs"),
            ("[telegraph]\ndefault_concurrency = 0", "default_concurrency"),
        ];
        for (section, field) in cases {
            let dir = tempfile::tempdir().unwrap();
            let path = write_config(&dir, &format!("{}\n{section}\n", minimal_toml()));
            let err = Config::load(&path).unwrap_err();
            assert!(err.to_string().contains(field), "got: {err}");
        }

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[server]\nlisten_addr = \"127.0.0.1:8080\"\nmax_connections = 0\n",
        );
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("max_connections"), "got: {err}");
    }

    #[test]
    fn test_tokens_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, minimal_toml());

        unsafe { set_env("TELEGRAPH_TOKEN", " tok-a , tok-b,,") };
        let config = Config::load(&path).unwrap();
        clear_env();

        let tokens: Vec<&str> = config.telegraph.tokens.iter().map(|t| t.expose()).collect();
        assert_eq!(tokens, ["tok-a", "tok-b"]);
    }

    #[test]
    fn test_tokens_from_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("tokens");
        std::fs::write(&token_path, "tok-file-1\ntok-file-2\n").unwrap();
        let path = write_config(
            &dir,
            &format!(
                "{}\n[telegraph]\ntoken_file = \"{}\"\n",
                minimal_toml(),
                token_path.display()
            ),
        );

        let config = Config::load(&path).unwrap();
        let tokens: Vec<&str> = config.telegraph.tokens.iter().map(|t| t.expose()).collect();
        assert_eq!(tokens, ["tok-file-1", "tok-file-2"]);
    }

    #[test]
    fn test_env_tokens_take_precedence_over_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("tokens");
        std::fs::write(&token_path, "from-file").unwrap();
        let path = write_config(
            &dir,
            &format!(
                "{}\n[telegraph]\ntoken_file = \"{}\"\n",
                minimal_toml(),
                token_path.display()
            ),
        );

        unsafe { set_env("TELEGRAPH_TOKEN", "from-env") };
        let config = Config::load(&path).unwrap();
        clear_env();

        assert_eq!(config.telegraph.tokens.len(), 1);
        assert_eq!(config.telegraph.tokens[0].expose(), "from-env");
    }

    #[test]
    fn test_missing_token_file_is_an_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            &format!(
                "{}\n[telegraph]\ntoken_file = \"/nonexistent/tokens\"\n",
                minimal_toml()
            ),
        );

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("token_file"), "got: {err}");
    }

    #[test]
    fn test_proxy_env_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            &format!(
                "{}\n[telegraph]\nproxy = \"http://file-proxy:3128\"\n",
                minimal_toml()
            ),
        );

        unsafe { set_env("TELEGRAPH_PROXY", "http://env-proxy:3128") };
        let config = Config::load(&path).unwrap();
        clear_env();

        assert_eq!(
            config.telegraph.proxy.as_deref(),
            Some("http://env-proxy:3128")
        );
    }

    #[test]
    fn test_tokens_are_redacted_in_debug() {
        let mut telegraph = TelegraphConfig::default();
        telegraph.tokens = parse_token_list("secret-token-value");
        let debug = format!("{telegraph:?}");
        assert!(!debug.contains("secret-token-value"));
    }

    #[test]
    fn test_resolve_path_prefers_cli() {
        let path = Config::resolve_path(Some("/etc/gateway.toml"));
        assert_eq!(path, PathBuf::from("/etc/gateway.toml"));
    }

    #[test]
    fn test_resolve_path_env_then_default() {
        let _lock = ENV_MUTEX.lock().unwrap();

        unsafe { set_env("CONFIG_PATH", "/run/config.toml") };
        assert_eq!(
            Config::resolve_path(None),
            PathBuf::from("/run/config.toml")
        );

        unsafe { remove_env("CONFIG_PATH") };
        assert_eq!(
            Config::resolve_path(None),
            PathBuf::from("publish-gateway.toml")
        );
    }
}
