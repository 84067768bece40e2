//! Link preview extraction: validate a candidate URL, fetch the page (following
//! redirects by hand so every hop passes the address guard), and pull title,
//! description, image and site name out of its metadata.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::{header, redirect, Client as ReqwestClient, Response};
use thiserror::Error;
use url::Url;

use crate::detector::{detect_urls, DetectedUrl};
use crate::error::{AppError, AppResult};
use crate::models::LinkPreview;

mod extract;
mod guard;

pub use extract::{absolutize_image, extract_og_data};
pub use guard::is_private_ip;

/// Sent with every page fetch; some sites refuse clients that do not look
/// like a browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub const DEFAULT_MAX_BODY_BYTES: u64 = 5 * 1024 * 1024; // 5MB
pub const MAX_REDIRECTS: usize = 10;

/// Upper bound on previews fetched at once for a single block of text.
pub const MAX_CONCURRENT_PREVIEWS: usize = 8;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("invalid URL")]
    InvalidUrl,

    #[error("URL resolves to a private or reserved address")]
    BlockedHost,

    #[error("failed to fetch URL: {0}")]
    FetchFailed(#[from] FetchFailure),
}

impl PreviewError {
    /// Message safe to show to API clients.
    pub fn public_message(&self) -> &'static str {
        match self {
            PreviewError::InvalidUrl => "Invalid URL format",
            PreviewError::BlockedHost => "URL resolves to a private or reserved address",
            PreviewError::FetchFailed(_) => "Failed to fetch URL",
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("upstream responded with status {0}")]
    Status(u16),

    #[error("could not resolve host: {0}")]
    Resolve(#[source] std::io::Error),

    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: u64 },

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("unusable redirect target: {0}")]
    BadRedirect(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Parse `candidate` as an absolute http(s) URL with a host.
pub fn validate_url(candidate: &str) -> Result<Url, PreviewError> {
    Url::parse(candidate)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .ok_or(PreviewError::InvalidUrl)
}

/// Knobs for page fetching.
#[derive(Debug, Clone)]
pub struct PreviewSettings {
    pub timeout: Duration,
    pub max_body_bytes: u64,
    /// Skip the private-address guard entirely.
    pub allow_private_hosts: bool,
    /// Hosts (`host` or `host:port`) trusted even when they resolve to a
    /// private address. Redirect targets are still checked on their own.
    pub exempt_hosts: Vec<String>,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            allow_private_hosts: false,
            exempt_hosts: Vec::new(),
        }
    }
}

/// Stateless preview extractor. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct PreviewExtractor {
    client: ReqwestClient,
    settings: PreviewSettings,
}

impl PreviewExtractor {
    pub fn new(settings: PreviewSettings) -> AppResult<Self> {
        // Redirects are followed in `fetch_html` so each hop is guarded.
        let client = ReqwestClient::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build link preview HTTP client");
                AppError::Internal
            })?;

        Ok(Self { client, settings })
    }

    /// Produce a preview for `candidate`. Invalid input fails before any
    /// network access.
    pub async fn extract(&self, candidate: &str) -> Result<LinkPreview, PreviewError> {
        let url = validate_url(candidate)?;
        let html = self.fetch_html(&url).await?;
        Ok(extract_og_data(&html, &url))
    }

    /// Detect every URL in `text` and extract previews for them, at most
    /// `MAX_CONCURRENT_PREVIEWS` at a time. Results keep detection order; one
    /// failure does not affect the others.
    pub async fn extract_from_text(
        &self,
        text: &str,
    ) -> Vec<(DetectedUrl, Result<LinkPreview, PreviewError>)> {
        let detected: Vec<DetectedUrl> = detect_urls(text).collect();
        let urls: Vec<String> = detected.iter().map(|d| d.url.clone()).collect();
        let previews: Vec<_> = stream::iter(urls)
            .map(|url| async move { self.extract(&url).await })
            .buffered(MAX_CONCURRENT_PREVIEWS)
            .collect()
            .await;
        detected.into_iter().zip(previews).collect()
    }

    async fn check_host(&self, url: &Url) -> Result<(), PreviewError> {
        if self.settings.allow_private_hosts || self.is_exempt(url) {
            return Ok(());
        }
        guard::ensure_public_host(url).await
    }

    fn is_exempt(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let authority = url.port().map(|port| format!("{host}:{port}"));
        self.settings
            .exempt_hosts
            .iter()
            .any(|h| h.eq_ignore_ascii_case(host) || Some(h) == authority.as_ref())
    }

    /// GET `url`, following up to `MAX_REDIRECTS` redirects. The original
    /// URL still names the page; only the body comes from the last hop.
    async fn fetch_html(&self, url: &Url) -> Result<String, PreviewError> {
        let mut current = url.clone();

        for _ in 0..=MAX_REDIRECTS {
            self.check_host(&current).await?;

            let response = self.client.get(current.clone()).send().await.map_err(|e| {
                tracing::warn!(error = ?e, url = %current, "Failed to fetch URL for link preview");
                FetchFailure::Transport(e)
            })?;

            let status = response.status();
            if status.is_redirection() {
                if let Some(next) = redirect_target(&current, &response)? {
                    tracing::debug!(from = %current, to = %next, "Following link preview redirect");
                    current = next;
                    continue;
                }
            }

            if !status.is_success() {
                tracing::warn!(status = status.as_u16(), url = %current, "Link preview target returned error status");
                return Err(FetchFailure::Status(status.as_u16()).into());
            }

            return read_body(response, self.settings.max_body_bytes)
                .await
                .map_err(|e| {
                    tracing::warn!(error = %e, url = %current, "Failed to read link preview body");
                    e.into()
                });
        }

        tracing::warn!(url = %url, "Link preview exceeded redirect limit");
        Err(FetchFailure::TooManyRedirects.into())
    }
}

/// Resolve a redirect's `Location` against the current URL. `None` when the
/// response carries no location (e.g. 304), which is then treated as a plain
/// non-success status.
fn redirect_target(current: &Url, response: &Response) -> Result<Option<Url>, FetchFailure> {
    let Some(location) = response.headers().get(header::LOCATION) else {
        return Ok(None);
    };
    let location = location
        .to_str()
        .map_err(|_| FetchFailure::BadRedirect("non-ASCII Location header".into()))?;
    let next = current
        .join(location)
        .map_err(|e| FetchFailure::BadRedirect(e.to_string()))?;
    if !matches!(next.scheme(), "http" | "https") {
        return Err(FetchFailure::BadRedirect(next.to_string()));
    }
    Ok(Some(next))
}

/// Read the body in chunks, stopping as soon as `limit` is exceeded so a
/// missing or lying Content-Length cannot bypass it.
async fn read_body(mut response: Response, limit: u64) -> Result<String, FetchFailure> {
    if response.content_length().is_some_and(|len| len > limit) {
        return Err(FetchFailure::BodyTooLarge { limit });
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if (body.len() + chunk.len()) as u64 > limit {
            return Err(FetchFailure::BodyTooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guarded() -> PreviewExtractor {
        PreviewExtractor::new(PreviewSettings::default()).unwrap()
    }

    #[test]
    fn accepts_http_and_https() {
        assert_eq!(
            validate_url("https://example.com").unwrap().as_str(),
            "https://example.com/"
        );
        assert!(validate_url("http://example.com/a?b=c").is_ok());
    }

    #[test]
    fn rejects_unparsable_input() {
        assert!(matches!(validate_url("not a url"), Err(PreviewError::InvalidUrl)));
        assert!(matches!(validate_url(""), Err(PreviewError::InvalidUrl)));
        assert!(matches!(validate_url("/relative/path"), Err(PreviewError::InvalidUrl)));
    }

    #[test]
    fn rejects_hostless_and_non_web_schemes() {
        assert!(matches!(validate_url("mailto:a@b.c"), Err(PreviewError::InvalidUrl)));
        assert!(matches!(validate_url("file:///etc/passwd"), Err(PreviewError::InvalidUrl)));
        assert!(matches!(validate_url("ftp://example.com/"), Err(PreviewError::InvalidUrl)));
    }

    #[test]
    fn exempt_hosts_match_host_or_authority() {
        let extractor = PreviewExtractor::new(PreviewSettings {
            exempt_hosts: vec!["intranet.local".into(), "127.0.0.1:8081".into()],
            ..PreviewSettings::default()
        })
        .unwrap();

        assert!(extractor.is_exempt(&Url::parse("http://INTRANET.local/wiki").unwrap()));
        assert!(extractor.is_exempt(&Url::parse("http://127.0.0.1:8081/").unwrap()));
        assert!(!extractor.is_exempt(&Url::parse("http://127.0.0.1:8082/").unwrap()));
        assert!(!extractor.is_exempt(&Url::parse("http://127.0.0.1/").unwrap()));
    }

    #[tokio::test]
    async fn invalid_input_fails_without_fetching() {
        assert!(matches!(
            guarded().extract("not a url").await,
            Err(PreviewError::InvalidUrl)
        ));
    }

    #[tokio::test]
    async fn loopback_target_is_blocked_by_default() {
        assert!(matches!(
            guarded().extract("http://127.0.0.1:9/").await,
            Err(PreviewError::BlockedHost)
        ));
    }

    #[tokio::test]
    async fn text_without_urls_yields_nothing() {
        assert!(guarded().extract_from_text("no links here").await.is_empty());
    }
}
