//! Rate-limited HTTP transport
//!
//! One transport instance is shared across the process. It provides:
//! - Per-source token-bucket throttling (governor)
//! - Retry with exponential backoff and Retry-After handling
//! - Response caching through an optional filesystem cache
//! - Per-source request counters for the build summary

mod cache;

pub use cache::ResponseCache;

use crate::config::HttpSettings;
use crate::errors::{AppError, Result};
use governor::{Quota, RateLimiter};
use rand::Rng;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Sources whose responses are never cached (LLM providers)
const UNCACHED_SOURCES: &[&str] = &["openai", "ollama"];

/// Token-bucket (refill rate, burst capacity) per source key
pub fn rate_for(source: &str) -> (u32, u32) {
    match source {
        "openalex" => (10, 10),
        "s2" => (1, 1),
        "openai" => (5, 5),
        "ollama" => (100, 100),
        _ => (5, 5),
    }
}

/// Decoded response body
#[derive(Debug, Clone)]
pub enum Body {
    Json(serde_json::Value),
    Text(String),
}

impl Body {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }
}

/// A completed HTTP exchange
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Body,
}

impl HttpResponse {
    /// The JSON body, or a transport error when the payload is not JSON
    pub fn json(&self) -> Result<&serde_json::Value> {
        self.body.as_json().ok_or_else(|| AppError::Transport {
            status: Some(self.status),
            message: "expected a JSON response body".to_string(),
            retryable: false,
        })
    }
}

/// Process-wide HTTP transport
pub struct Transport {
    client: reqwest::Client,
    limiters: Mutex<HashMap<String, Arc<DirectLimiter>>>,
    counts: Mutex<HashMap<String, u64>>,
    cache: Option<ResponseCache>,
    settings: HttpSettings,
}

impl Transport {
    pub fn new(
        settings: HttpSettings,
        contact_email: &str,
        cache: Option<ResponseCache>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(crate::user_agent(contact_email))
            .gzip(true)
            .build()
            .map_err(AppError::from)?;

        Ok(Self {
            client,
            limiters: Mutex::new(HashMap::new()),
            counts: Mutex::new(HashMap::new()),
            cache,
            settings,
        })
    }

    /// GET with throttling, caching, and retry
    pub async fn get(&self, source: &str, url: &str) -> Result<HttpResponse> {
        self.request(source, url, None, &[]).await
    }

    /// GET carrying extra request headers (e.g. `x-api-key`)
    pub async fn get_with_headers(
        &self,
        source: &str,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse> {
        self.request(source, url, None, headers).await
    }

    /// POST a JSON body with throttling, caching, and retry
    pub async fn post_json(
        &self,
        source: &str,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse> {
        self.request(source, url, Some(body), &[]).await
    }

    /// POST a JSON body carrying extra request headers
    pub async fn post_json_with_headers(
        &self,
        source: &str,
        url: &str,
        body: &serde_json::Value,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse> {
        self.request(source, url, Some(body), headers).await
    }

    /// Requests issued so far, per source key
    pub fn request_counts(&self) -> HashMap<String, u64> {
        self.counts.lock().expect("counts lock").clone()
    }

    async fn request(
        &self,
        source: &str,
        url: &str,
        body: Option<&serde_json::Value>,
        extra_headers: &[(&str, &str)],
    ) -> Result<HttpResponse> {
        let cacheable = self.cache.is_some() && !UNCACHED_SOURCES.contains(&source);
        let cache_key = cacheable.then(|| {
            let canonical = body.map(|b| b.to_string());
            ResponseCache::cache_key(url, canonical.as_deref())
        });

        if let (Some(cache), Some(key)) = (self.cache.as_ref(), cache_key.as_deref()) {
            if let Some(data) = cache.get(key) {
                debug!(source, url, "Response cache hit");
                return Ok(HttpResponse {
                    status: 200,
                    headers: HashMap::new(),
                    body: Body::Json(data),
                });
            }
        }

        let mut last_err = None;
        for attempt in 0..=self.settings.max_retries {
            self.acquire_token(source).await;
            self.count_request(source);

            let mut request = match body {
                Some(json) => self.client.post(url).json(json),
                None => self.client.get(url),
            };
            for (name, value) in extra_headers {
                request = request.header(*name, *value);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let headers: HashMap<String, String> = response
                        .headers()
                        .iter()
                        .filter_map(|(name, value)| {
                            value
                                .to_str()
                                .ok()
                                .map(|v| (name.as_str().to_string(), v.to_string()))
                        })
                        .collect();

                    if response.status().is_success() {
                        let decoded = decode_body(&headers, response.bytes().await?.to_vec());
                        if let (Some(cache), Some(key), Body::Json(value)) =
                            (self.cache.as_ref(), cache_key.as_deref(), &decoded)
                        {
                            cache.put(key, url, value);
                        }
                        return Ok(HttpResponse {
                            status,
                            headers,
                            body: decoded,
                        });
                    }

                    let payload = response.text().await.unwrap_or_default();
                    let err = AppError::from_status(status, payload);
                    if !err.is_retryable() || attempt == self.settings.max_retries {
                        return Err(err);
                    }

                    // Retry-After from a 429 overrides the computed backoff
                    let delay = parse_retry_after(&headers)
                        .filter(|_| status == 429)
                        .unwrap_or_else(|| self.backoff_delay(attempt));
                    warn!(
                        source,
                        status,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after transient HTTP error"
                    );
                    tokio::time::sleep(delay).await;
                    last_err = Some(err);
                }
                Err(e) => {
                    let err = AppError::from(e);
                    if !err.is_retryable() || attempt == self.settings.max_retries {
                        return Err(err);
                    }
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        source,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying after transport failure"
                    );
                    tokio::time::sleep(delay).await;
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| AppError::Transport {
            status: None,
            message: "all retry attempts exhausted".to_string(),
            retryable: false,
        }))
    }

    /// Wait for one token from the source's bucket
    async fn acquire_token(&self, source: &str) {
        let limiter = {
            let mut limiters = self.limiters.lock().expect("limiters lock");
            limiters
                .entry(source.to_string())
                .or_insert_with(|| {
                    let (rate, burst) = rate_for(source);
                    let quota = Quota::per_second(NonZeroU32::new(rate).expect("nonzero rate"))
                        .allow_burst(NonZeroU32::new(burst).expect("nonzero burst"));
                    Arc::new(RateLimiter::direct(quota))
                })
                .clone()
        };
        limiter.until_ready().await;
    }

    fn count_request(&self, source: &str) {
        let mut counts = self.counts.lock().expect("counts lock");
        *counts.entry(source.to_string()).or_insert(0) += 1;
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let jitter: f64 = rand::thread_rng().gen_range(0.0..0.5);
        backoff_with_jitter(&self.settings, attempt, jitter)
    }
}

/// `min(max, initial * 2^attempt + jitter_fraction * initial * 2^attempt)`
fn backoff_with_jitter(settings: &HttpSettings, attempt: u32, jitter_fraction: f64) -> Duration {
    let base = settings.initial_backoff_secs as f64 * 2f64.powi(attempt as i32);
    let with_jitter = base + base * jitter_fraction;
    Duration::from_secs_f64(with_jitter.min(settings.max_backoff_secs as f64))
}

/// Parse a Retry-After header: integer seconds or an HTTP-date
pub fn parse_retry_after(headers: &HashMap<String, String>) -> Option<Duration> {
    let value = headers.get("retry-after").or_else(|| headers.get("Retry-After"))?;

    if let Ok(secs) = value.trim().parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let when = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let delta = when.signed_duration_since(chrono::Utc::now());
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

fn decode_body(headers: &HashMap<String, String>, bytes: Vec<u8>) -> Body {
    let is_json = headers
        .get("content-type")
        .map(|ct| ct.contains("json"))
        .unwrap_or(false);
    if is_json {
        if let Ok(value) = serde_json::from_slice(&bytes) {
            return Body::Json(value);
        }
    }
    Body::Text(String::from_utf8_lossy(&bytes).into_owned())
}
