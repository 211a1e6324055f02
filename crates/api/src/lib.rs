//! Chat server API client.
//!
//! This crate provides:
//!
//! - [`ChatClient`]: a thin `reqwest` wrapper for the server's v4 REST API,
//!   with credential discovery from `MURMUR_TOKEN` or `~/.netrc`
//! - [`DirectoryService`]: the asynchronous contract the UI consumes for
//!   user/group lookup and conversation opening
//! - [`MemoryDirectory`]: an in-memory implementation for demo mode and tests
//!
//! # Example
//!
//! ```ignore
//! use murmur_api::{ChatClient, DirectoryService};
//!
//! async fn whoami() -> anyhow::Result<()> {
//!     let client = ChatClient::from_env("https://chat.example.com")?;
//!     let me = client.current_user().await?;
//!     println!("signed in as @{}", me.username);
//!     Ok(())
//! }
//! ```

use std::time::Duration;
use std::{env, fs};

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, RequestBuilder, Url, header};
use tracing::debug;

mod directory;
mod memory;

pub use directory::DirectoryService;
pub use memory::{DirectoryCall, MemoryDirectory};

/// Environment variable holding a personal access token.
pub const TOKEN_ENV: &str = "MURMUR_TOKEN";

/// Path prefix of the versioned REST API.
const API_PREFIX: &str = "/api/v4";

/// Hostnames allowed to use plain HTTP.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client` for the chat server.
///
/// Default headers (bearer token, `Accept: application/json`) are installed
/// once; requests are built against the validated server URL.
pub struct ChatClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
}

impl ChatClient {
    /// Construct a client for `server_url` with an explicit token.
    ///
    /// Non-localhost servers must use HTTPS.
    pub fn new(server_url: &str, token: Option<String>) -> Result<Self> {
        let parsed = validate_base_url(server_url)?;

        let http = Client::builder()
            .default_headers(default_headers(token.as_deref())?)
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            http,
            user_agent: format!("murmur/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    /// Construct a client whose token comes from `MURMUR_TOKEN` or the
    /// `~/.netrc` entry for the server's host.
    pub fn from_env(server_url: &str) -> Result<Self> {
        let host = Url::parse(server_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_default();
        let token = env::var(TOKEN_ENV).ok().filter(|t| !t.trim().is_empty()).or_else(|| get_netrc_token(&host));
        Self::new(server_url, token)
    }

    /// Build a request for a method and API-relative path (`/users/me`).
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}{}", self.base_url, API_PREFIX, path);
        debug!(%method, %url, "building request");

        self.http.request(method, url).header(header::USER_AGENT, &self.user_agent)
    }
}

/// Headers sent with every request: the bearer token when present, plus JSON negotiation.
fn default_headers(token: Option<&str>) -> Result<header::HeaderMap> {
    let mut headers = header::HeaderMap::new();
    if let Some(token) = token {
        let authorization_header_value = format!("Bearer {}", token.trim());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&authorization_header_value).context("token contains invalid header characters")?,
        );
    }
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    headers.insert("X-Requested-With", header::HeaderValue::from_static("XMLHttpRequest"));
    Ok(headers)
}

/// Validate that a server URL is acceptable for use by the client.
///
/// `localhost`/`127.0.0.1` may use any scheme; every other host must use HTTPS.
fn validate_base_url(base: &str) -> Result<Url> {
    let parsed_base_url = Url::parse(base).map_err(|e| anyhow!("Invalid server URL '{}': {}", base, e))?;

    let host_name = parsed_base_url.host_str().ok_or_else(|| anyhow!("server URL must include a host"))?;

    if LOCALHOST_DOMAINS.iter().any(|&allowed| host_name.eq_ignore_ascii_case(allowed)) {
        return Ok(parsed_base_url);
    }

    if parsed_base_url.scheme() != "https" {
        return Err(anyhow!(
            "server URL must use https for non-localhost hosts; got '{}://'",
            parsed_base_url.scheme()
        ));
    }

    Ok(parsed_base_url)
}

/// Attempt to read a token for `host` from the user's `~/.netrc` file.
fn get_netrc_token(host: &str) -> Option<String> {
    if host.is_empty() {
        return None;
    }
    let home = dirs_next::home_dir()?;
    let content = fs::read_to_string(home.join(".netrc")).ok()?;
    parse_netrc_for_host(&content, host)
}

/// Minimal `.netrc` reader: returns the `password` of the `machine <host>` stanza.
///
/// ```text
/// machine chat.example.com
///   login token
///   password <TOKEN>
/// ```
fn parse_netrc_for_host(content: &str, host: &str) -> Option<String> {
    let mut tokens = content.split_whitespace();
    let mut in_stanza = false;

    while let Some(token) = tokens.next() {
        match token {
            "machine" => {
                in_stanza = tokens.next().is_some_and(|name| name.eq_ignore_ascii_case(host));
            }
            "default" => in_stanza = false,
            "password" if in_stanza => return tokens.next().map(str::to_string),
            _ => {}
        }
    }
    None
}
