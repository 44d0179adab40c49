// src/apd/client.rs
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, Url};

use crate::apd::form;
use crate::utils::error::{AppError, FetchError};
use crate::utils::html_debug;

pub const BASE_URL: &str = "https://aps.unmc.edu";
const SEARCH_PATH: &str = "/database";
const RECORD_PATH: &str = "/database/peptide";

const APD_USER_AGENT: &str = "Mozilla/5.0 (compatible; apd6-scraper/1.0)";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Bounded retry schedule: attempt `n` failing waits
/// `min(cap, step * n)` plus up to `jitter` before attempt `n + 1`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub step: Duration,
    pub cap: Duration,
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            step: Duration::from_secs(2),
            cap: Duration::from_secs(30),
            jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Same attempt count, no waiting.
    #[cfg(test)]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            step: Duration::ZERO,
            cap: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        let base = self.step.saturating_mul(attempt).min(self.cap);
        if self.jitter.is_zero() {
            return base;
        }
        base + self.jitter.mul_f64(rand::rng().random::<f64>())
    }
}

/// Runs `op` until it succeeds or `policy.max_attempts` is spent. The final
/// error wraps the last failure.
pub async fn with_retries<T, F, Fut>(
    policy: &RetryPolicy,
    method: &str,
    url: &str,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last = None;

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!("{} {} failed (attempt {}/{}): {}", method, url, attempt, attempts, e);
                last = Some(e);
            }
        }
        if attempt < attempts {
            let delay = policy.delay_after(attempt);
            tracing::debug!("Waiting {:?} before retrying {}", delay, url);
            tokio::time::sleep(delay).await;
        }
    }

    Err(FetchError::Exhausted {
        method: method.to_string(),
        url: url.to_string(),
        attempts,
        last: Box::new(last.unwrap_or(FetchError::InvalidUrl(url.to_string()))),
    })
}

/// Where pages come from. The crawler only needs the result listing of an
/// empty search and one page per identifier.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn search_results(&self) -> Result<String, AppError>;
    async fn record_page(&self, id: &str) -> Result<String, AppError>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub retry: RetryPolicy,
    /// Pages that fail structural checks are saved here.
    pub debug_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            debug_dir: PathBuf::from("."),
        }
    }
}

/// HTTP session against the APD web interface. Cookies persist across
/// requests so the result listing and record posts share the search session.
pub struct ApdClient {
    http: reqwest::Client,
    base: Url,
    config: ClientConfig,
}

impl ApdClient {
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let http = reqwest::Client::builder()
            .user_agent(APD_USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { http, base, config })
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Issues one logical request with retries and returns the full body.
    pub async fn request(
        &self,
        method: Method,
        url: &Url,
        payload: Option<&[(String, String)]>,
    ) -> Result<String, FetchError> {
        with_retries(&self.config.retry, method.as_str(), url.as_str(), || {
            self.send_once(method.clone(), url.clone(), payload)
        })
        .await
    }

    async fn send_once(
        &self,
        method: Method,
        url: Url,
        payload: Option<&[(String, String)]>,
    ) -> Result<String, FetchError> {
        let mut builder = self
            .http
            .request(method, url.clone())
            .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*");
        if let Some(fields) = payload {
            builder = builder.form(fields);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!("HTTP error status: {} for URL: {}", status, url);
            return Err(FetchError::Http(status));
        }

        let body = response.text().await?;
        tracing::debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

impl PageSource for ApdClient {
    /// Loads the search page, replays its form with no filters and returns
    /// the result listing.
    async fn search_results(&self) -> Result<String, AppError> {
        let search_url = self.endpoint(SEARCH_PATH)?;
        let page = self.request(Method::GET, &search_url, None).await?;

        let search_form = match form::find_search_form(&page, &search_url) {
            Ok(f) => f,
            Err(e) => {
                if let Err(dump_err) =
                    html_debug::dump_page(&self.config.debug_dir, "debug_database.html", &page)
                {
                    tracing::warn!("Could not save debug_database.html: {}", dump_err);
                }
                return Err(e.into());
            }
        };

        tracing::info!("Submitting empty search to {}", search_form.action_url);
        let listing = self
            .request(Method::POST, &search_form.action_url, Some(search_form.payload.as_slice()))
            .await?;
        Ok(listing)
    }

    async fn record_page(&self, id: &str) -> Result<String, AppError> {
        let url = self.endpoint(RECORD_PATH)?;
        let payload = [("ID".to_string(), id.to_string())];
        Ok(self.request(Method::POST, &url, Some(&payload[..])).await?)
    }
}
