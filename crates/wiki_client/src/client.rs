//! Wiki HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required).
//! Covers token acquisition (lazy, cached), document creation, and
//! node listing with pagination.
//!
//! The wiki API layers an application-level status code inside otherwise
//! successful HTTP responses: `code == 0` means success, anything else is
//! a logical rejection carrying a `msg`. Callers of this client never see
//! that split — logical rejections surface as [`WikiError::Api`].

use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::auth::{load_auth, AppCredentials};

/// Default API base for the hosted wiki service.
pub const DEFAULT_API_BASE: &str = "https://open.feishu.cn/open-apis";

const TOKEN_PATH: &str = "/auth/v3/tenant_access_token/internal";
const MAX_RETRIES: u32 = 3;
const NODE_PAGE_SIZE: u32 = 50;
const USER_AGENT: &str = concat!("wikisync/", env!("CARGO_PKG_VERSION"));

/// Wiki API client (blocking).
///
/// Holds at most one tenant access token, fetched lazily on the first
/// authenticated call and reused until [`WikiClient::invalidate_token`].
pub struct WikiClient {
    http: reqwest::blocking::Client,
    api_base: String,
    app_id: String,
    app_secret: String,
    token: Option<String>,
    backoff_base: Duration,
}

/// Error type for wiki operations.
#[derive(Debug)]
pub enum WikiError {
    /// No credentials configured
    NotAuthenticated,
    /// Network error (connection, timeout, TLS)
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// Application-level rejection: non-zero `code` in a 200 response
    Api(i64, String),
    /// JSON parsing error
    Parse(String),
    /// File I/O error
    Io(String),
    /// Document content is empty after whitespace trimming
    EmptyDocument(String),
}

impl std::fmt::Display for WikiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WikiError::NotAuthenticated => write!(f, "Not authenticated — run `wikisync login` first"),
            WikiError::Network(msg) => write!(f, "Network error: {}", msg),
            WikiError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            WikiError::Api(code, msg) => write!(f, "API error {}: {}", code, msg),
            WikiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            WikiError::Io(msg) => write!(f, "I/O error: {}", msg),
            WikiError::EmptyDocument(path) => write!(f, "Empty document: {}", path),
        }
    }
}

impl std::error::Error for WikiError {}

/// Transport options. Defaults match production use; tests shrink the
/// backoff so the retry loop runs in milliseconds.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Wall-clock timeout applied to every request
    pub timeout: Duration,
    /// Disable TLS certificate verification. Explicit opt-in only.
    pub insecure_tls: bool,
    /// First retry delay; doubles on each subsequent retry
    pub backoff_base: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            insecure_tls: false,
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// A node in the wiki space tree.
#[derive(Debug, Clone)]
pub struct WikiNode {
    pub title: String,
    pub node_token: String,
    pub obj_type: String,
    pub parent_node_token: Option<String>,
}

impl WikiClient {
    /// Create a new client using saved credentials.
    pub fn from_saved_auth() -> Result<Self, WikiError> {
        let creds = load_auth().ok_or(WikiError::NotAuthenticated)?;
        Ok(Self::new(creds))
    }

    /// Create a new client with explicit credentials and default options.
    pub fn new(creds: AppCredentials) -> Self {
        Self::with_options(creds, ClientOptions::default())
    }

    /// Create a new client with explicit credentials and transport options.
    pub fn with_options(creds: AppCredentials, opts: ClientOptions) -> Self {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(opts.timeout);

        if opts.insecure_tls {
            log::warn!("TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().expect("failed to build HTTP client");

        Self {
            http,
            api_base: creds.api_base,
            app_id: creds.app_id,
            app_secret: creds.app_secret,
            token: None,
            backoff_base: opts.backoff_base,
        }
    }

    /// Whether a tenant access token is currently cached.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Drop the cached token. The next authenticated call re-acquires one.
    pub fn invalidate_token(&mut self) {
        self.token = None;
    }

    /// Return the cached tenant access token, fetching it on first use.
    ///
    /// A fetch failure caches nothing, so a subsequent call re-attempts
    /// acquisition.
    pub fn ensure_token(&mut self) -> Result<String, WikiError> {
        if self.token.is_none() {
            let token = self.fetch_token()?;
            log::debug!("tenant access token acquired");
            self.token = Some(token);
        }
        Ok(self.token.clone().unwrap_or_default())
    }

    fn fetch_token(&self) -> Result<String, WikiError> {
        let url = format!("{}{}", self.api_base, TOKEN_PATH);
        let body = serde_json::json!({
            "app_id": self.app_id,
            "app_secret": self.app_secret,
        });

        let json = self.post_with_retry(&url, &body, None)?;
        let json = check_api_code(json)?;
        json_str(&json, "tenant_access_token")
    }

    /// Create a wiki document under `parent_token` in `space_id`.
    /// Returns the node token assigned by the server.
    pub fn create_doc(
        &mut self,
        space_id: &str,
        parent_token: &str,
        title: &str,
        content: &str,
    ) -> Result<String, WikiError> {
        let token = self.ensure_token()?;
        let url = format!("{}/wiki/v2/spaces/{}/documents", self.api_base, space_id);
        let body = doc_payload(parent_token, title, content);

        let json = self.post_with_retry(&url, &body, Some(token.as_str()))?;
        let json = check_api_code(json)?;
        json_str(&json["data"], "node_token")
    }

    /// Upload one local Markdown file as a wiki document.
    ///
    /// Preconditions checked before any network call: the file exists, is
    /// UTF-8 text, and is non-empty after whitespace trimming. The title is
    /// the file name without extension.
    pub fn upload_file(
        &mut self,
        space_id: &str,
        parent_token: &str,
        path: &Path,
    ) -> Result<String, WikiError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WikiError::Io(format!("cannot read {}: {}", path.display(), e)))?;

        if content.trim().is_empty() {
            return Err(WikiError::EmptyDocument(path.display().to_string()));
        }

        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| WikiError::Io(format!("cannot derive title from {}", path.display())))?
            .to_string();

        self.create_doc(space_id, parent_token, &title, &content)
    }

    /// List all nodes in a space, following pagination.
    pub fn list_nodes(&mut self, space_id: &str) -> Result<Vec<WikiNode>, WikiError> {
        let token = self.ensure_token()?;
        let url = format!("{}/wiki/v2/spaces/{}/nodes", self.api_base, space_id);

        let mut nodes = Vec::new();
        let mut page_token = String::new();

        loop {
            let params = vec![
                ("page_size".to_string(), NODE_PAGE_SIZE.to_string()),
                ("page_token".to_string(), page_token.clone()),
            ];

            let json = self.get_with_retry(&url, &params, Some(token.as_str()))?;
            let json = check_api_code(json)?;
            let data = &json["data"];

            let items = data["items"].as_array().ok_or_else(|| {
                WikiError::Parse("node list response missing 'items' array".into())
            })?;

            for item in items {
                nodes.push(WikiNode {
                    title: item["title"].as_str().unwrap_or("").to_string(),
                    node_token: item["node_token"].as_str().unwrap_or("").to_string(),
                    obj_type: item["obj_type"].as_str().unwrap_or("").to_string(),
                    parent_node_token: item["parent_node_token"]
                        .as_str()
                        .filter(|s| !s.is_empty())
                        .map(String::from),
                });
            }

            if !data["has_more"].as_bool().unwrap_or(false) {
                break;
            }

            // Pagination guard: detect stuck pagination
            let next = data["page_token"].as_str().unwrap_or("").to_string();
            if next.is_empty() || next == page_token {
                return Err(WikiError::Parse(
                    "node pagination stuck: same page token returned twice".into(),
                ));
            }
            page_token = next;
        }

        Ok(nodes)
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn post_with_retry(
        &self,
        url: &str,
        body: &serde_json::Value,
        token: Option<&str>,
    ) -> Result<serde_json::Value, WikiError> {
        self.send_with_retry("POST", url, |http| {
            let mut req = http.post(url).json(body);
            if let Some(t) = token {
                req = req.bearer_auth(t);
            }
            req
        })
    }

    fn get_with_retry(
        &self,
        url: &str,
        params: &[(String, String)],
        token: Option<&str>,
    ) -> Result<serde_json::Value, WikiError> {
        self.send_with_retry("GET", url, |http| {
            let mut req = http.get(url).query(params);
            if let Some(t) = token {
                req = req.bearer_auth(t);
            }
            req
        })
    }

    /// Make a request with retry + exponential backoff.
    ///
    /// `build_request` is called once per attempt. Retries happen only on
    /// 429, 5xx, and transport-level send errors; any other non-success
    /// status fails immediately with the service-provided message.
    fn send_with_retry(
        &self,
        method: &str,
        url: &str,
        build_request: impl Fn(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<serde_json::Value, WikiError> {
        let mut backoff = self.backoff_base;

        for attempt in 0..=MAX_RETRIES {
            log::debug!("{} {} (attempt {})", method, url, attempt + 1);
            let result = build_request(&self.http).send();

            match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    log::debug!("{} {} -> HTTP {}", method, url, status);

                    // Retryable: 429, 5xx
                    if status == 429 || status >= 500 {
                        if attempt == MAX_RETRIES {
                            return Err(WikiError::Http(
                                status,
                                format!("gave up after {} attempts", MAX_RETRIES + 1),
                            ));
                        }

                        // Respect Retry-After header for 429
                        let wait = if status == 429 {
                            resp.headers()
                                .get("retry-after")
                                .and_then(|v| v.to_str().ok())
                                .and_then(|v| v.parse::<u64>().ok())
                                .map(Duration::from_secs)
                                .unwrap_or(backoff)
                        } else {
                            backoff
                        };

                        log::warn!(
                            "retry {}/{} in {:?} (HTTP {})",
                            attempt + 1,
                            MAX_RETRIES,
                            wait,
                            status,
                        );
                        thread::sleep(wait);
                        backoff *= 2;
                        continue;
                    }

                    // Other non-success: fail immediately
                    if !(200..300).contains(&status) {
                        let text = resp.text().unwrap_or_default();
                        return Err(WikiError::Http(status, extract_api_msg(&text)));
                    }

                    let text = resp.text().map_err(|e| {
                        WikiError::Network(format!("failed to read response body: {}", e))
                    })?;
                    log::debug!("{} {} body: {}", method, url, truncate_chars(&text, 500));

                    return serde_json::from_str(&text).map_err(|e| {
                        WikiError::Parse(format!(
                            "bad JSON response: {} (body: {})",
                            e,
                            truncate_chars(&text, 200),
                        ))
                    });
                }
                Err(e) => {
                    // Network/timeout errors: retry
                    if attempt == MAX_RETRIES {
                        return Err(WikiError::Network(format!(
                            "{} after {} attempts",
                            e,
                            MAX_RETRIES + 1,
                        )));
                    }

                    log::warn!("retry {}/{} in {:?} ({})", attempt + 1, MAX_RETRIES, backoff, e);
                    thread::sleep(backoff);
                    backoff *= 2;
                }
            }
        }

        unreachable!()
    }
}

// ── Free functions ──────────────────────────────────────────────────

/// Build the create-document request body.
fn doc_payload(parent_token: &str, title: &str, content: &str) -> serde_json::Value {
    serde_json::json!({
        "parent_node_token": parent_token,
        "title": title,
        "obj_type": "doc",
        "content": content,
    })
}

/// Enforce the application-level status convention: `code == 0` is success,
/// anything else is a rejection carrying `msg`.
fn check_api_code(json: serde_json::Value) -> Result<serde_json::Value, WikiError> {
    match json["code"].as_i64() {
        Some(0) => Ok(json),
        Some(code) => {
            let msg = json["msg"].as_str().unwrap_or("unknown error").to_string();
            log::debug!("API rejection: code={} msg={}", code, msg);
            Err(WikiError::Api(code, msg))
        }
        None => Err(WikiError::Parse("response missing 'code' field".into())),
    }
}

/// Truncate to at most `max` characters without splitting a code point.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Pull a human-readable message out of an error response body.
fn extract_api_msg(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["msg"].as_str().map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn json_str(json: &serde_json::Value, key: &str) -> Result<String, WikiError> {
    json[key]
        .as_str()
        .map(String::from)
        .ok_or_else(|| WikiError::Parse(format!("Missing {} in response", key)))
}

// ── Tests ───────────────────────────────────────────────────────────
