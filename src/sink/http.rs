// HTTP sink: posts payloads to a metrics endpoint in the background
use arc_swap::ArcSwap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Compression, Meter, Sink};
use crate::config::SinkConfig;
use crate::error::{NetmetaError, Result};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "DD-API-KEY";

/// Fire-and-forget HTTP delivery with rolling win/error rates
///
/// Each `send` spawns its own task on the current tokio runtime. A transport
/// failure replaces the shared client before the next delivery.
#[derive(Clone)]
pub struct HttpSink {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    headers: HeaderMap,
    timeout: Duration,
    tls_insecure: bool,
    client: ArcSwap<Client>,
    in_flight: AtomicUsize,
    delivery_err: Meter,
    delivery_win: Meter,
}

impl HttpSink {
    /// Build a sink, reading the API key from `config.api_key_env`
    pub fn new(config: &SinkConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
        if api_key.is_empty() {
            return Err(NetmetaError::MissingEnv(config.api_key_env.clone()));
        }
        Self::with_api_key(config, &api_key)
    }

    /// Build a sink with an explicit API key
    pub fn with_api_key(config: &SinkConfig, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if config.compression == Compression::Gzip {
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static("GZIP"));
        }
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| NetmetaError::Sink(format!("Invalid API key header value: {}", e)))?;
        headers.insert(HeaderName::from_static("dd-api-key"), key);

        let client = build_client(config.tls_insecure)?;

        tracing::info!("Exporting to {}", config.url);

        Ok(Self {
            inner: Arc::new(Inner {
                url: config.url.clone(),
                headers,
                timeout: Duration::from_secs(config.timeout_secs),
                tls_insecure: config.tls_insecure,
                client: ArcSwap::from_pointee(client),
                in_flight: AtomicUsize::new(0),
                delivery_err: Meter::new(),
                delivery_win: Meter::new(),
            }),
        })
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Deliveries spawned but not yet finished
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Wait until outstanding deliveries finish or the sink timeout elapses
    pub async fn flush(&self) {
        let deadline = Instant::now() + self.inner.timeout;
        while self.in_flight() > 0 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Total (wins, errors) since creation
    pub fn delivery_counts(&self) -> (u64, u64) {
        (
            self.inner.delivery_win.count(),
            self.inner.delivery_err.count(),
        )
    }
}

impl Sink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    fn send(&self, payload: Vec<u8>) {
        let inner = self.inner.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                inner.in_flight.fetch_add(1, Ordering::AcqRel);
                handle.spawn(async move {
                    inner.deliver(payload).await;
                    inner.in_flight.fetch_sub(1, Ordering::AcqRel);
                });
            }
            Err(e) => {
                tracing::error!("Cannot send to {}: no async runtime: {}", inner.url, e);
                inner.delivery_err.mark(1);
            }
        }
    }

    fn http_info(&self) -> HashMap<String, f64> {
        HashMap::from([
            ("DeliveryErr".to_string(), self.inner.delivery_err.rate1()),
            ("DeliveryWin".to_string(), self.inner.delivery_win.rate1()),
        ])
    }
}

impl Inner {
    async fn deliver(&self, payload: Vec<u8>) {
        match tokio::time::timeout(self.timeout, self.post(payload)).await {
            Ok(()) => {}
            Err(_) => {
                tracing::error!("Delivery to {} timed out after {:?}", self.url, self.timeout);
                self.delivery_err.mark(1);
            }
        }
    }

    async fn post(&self, payload: Vec<u8>) {
        let client = self.client.load_full();
        let response = client
            .post(&self.url)
            .headers(self.headers.clone())
            .body(payload)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Cannot write to {}: {}, creating new client", self.url, e);
                self.delivery_err.mark(1);
                self.recycle_client();
                return;
            }
        };

        let status = response.status();
        match response.text().await {
            Err(e) => {
                tracing::error!("Cannot get resp body from {}: {}", self.url, e);
                self.delivery_err.mark(1);
            }
            Ok(body) if status.as_u16() >= 400 => {
                tracing::error!(
                    "Cannot write to {}, status code {}, bdy: {}",
                    self.url,
                    status.as_u16(),
                    body
                );
                self.delivery_err.mark(1);
            }
            Ok(_) => {
                self.delivery_win.mark(1);
            }
        }
    }

    fn recycle_client(&self) {
        match build_client(self.tls_insecure) {
            Ok(client) => self.client.store(Arc::new(client)),
            Err(e) => tracing::error!("Cannot build replacement HTTP client: {}", e),
        }
    }
}

fn build_client(tls_insecure: bool) -> Result<Client> {
    Ok(Client::builder()
        .danger_accept_invalid_certs(tls_insecure)
        .build()?)
}
