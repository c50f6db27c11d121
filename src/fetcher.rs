use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use reqwest::Url;
use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::codec::{Codec, DecodeError};

// ─── Errors ──────────────────────────────────────────────────────

/// Why a single measurement produced no usable sample.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server answered HTTP {0}")]
    NonSuccessStatus(u16),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

// ─── Fetch seam ──────────────────────────────────────────────────

/// A downloaded payload and the time it took to get it.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    /// Request + full body read, in microseconds
    pub elapsed_micros: u64,
}

impl Fetched {
    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Source of payloads for the runner.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, codec: Codec) -> impl Future<Output = Result<Fetched, SampleError>> + Send;
}

// ─── Cache buster ────────────────────────────────────────────────

/// Unix-millisecond values that never repeat within the process, even when
/// two requests start in the same millisecond.
#[derive(Debug, Default)]
pub struct CacheBuster {
    last: AtomicI64,
}

impl CacheBuster {
    pub fn next(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|v| v);
        now.max(prev + 1)
    }
}

/// Appends `cb=<value>`, keeping any query already present.
pub fn cache_busted(url: &Url, cb: i64) -> Url {
    let mut url = url.clone();
    url.query_pairs_mut().append_pair("cb", &cb.to_string());
    url
}

// ─── HTTP implementation ─────────────────────────────────────────

/// Fetches the dataset endpoints of a running server.
///
/// Idle connections are not pooled and no cookie store is attached, so
/// every request pays for its own connection setup.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base: Url,
    buster: Arc<CacheBuster>,
}

impl HttpFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("invalid benchmark target \"{base_url}\""))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(0)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base,
            buster: Arc::new(CacheBuster::default()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Endpoint for `codec`, without the cache buster.
    pub fn endpoint(&self, codec: Codec) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}{}", url.path().trim_end_matches('/'), codec.path());
        url.set_path(&path);
        url
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, codec: Codec) -> Result<Fetched, SampleError> {
        let url = cache_busted(&self.endpoint(codec), self.buster.next());

        // ── Timed section ───────────────────────────────────────
        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SampleError::NonSuccessStatus(status.as_u16()));
        }
        let body = response.bytes().await?;
        let elapsed_micros = start.elapsed().as_micros() as u64;
        // ────────────────────────────────────────────────────────

        Ok(Fetched {
            bytes: body.to_vec(),
            elapsed_micros,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_buster_is_strictly_increasing() {
        let buster = CacheBuster::default();
        let values: Vec<i64> = (0..1000).map(|_| buster.next()).collect();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert!(values[0] >= chrono::Utc::now().timestamp_millis() - 60_000);
    }

    #[test]
    fn cache_busted_uses_ampersand_when_query_exists() {
        let plain = Url::parse("http://h/tasks/json").unwrap();
        assert_eq!(cache_busted(&plain, 42).as_str(), "http://h/tasks/json?cb=42");

        let with_query = Url::parse("http://h/tasks/json?x=1").unwrap();
        assert_eq!(
            cache_busted(&with_query, 42).as_str(),
            "http://h/tasks/json?x=1&cb=42"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let f = HttpFetcher::new("http://10.0.2.2:5233/bench/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            f.endpoint(Codec::CompactBinary).as_str(),
            "http://10.0.2.2:5233/bench/tasks/protobuf"
        );
        let f = HttpFetcher::new("http://localhost:5233", Duration::from_secs(1)).unwrap();
        assert_eq!(
            f.endpoint(Codec::StructuredText).as_str(),
            "http://localhost:5233/tasks/json"
        );
    }

    #[test]
    fn invalid_target_is_rejected() {
        assert!(HttpFetcher::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_error() {
        // Port 1 is privileged and not listening in test environments.
        let f = HttpFetcher::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = f.fetch(Codec::StructuredText).await.unwrap_err();
        assert!(matches!(err, SampleError::Network(_)), "{err}");
    }
}
