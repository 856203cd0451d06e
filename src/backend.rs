//! Upstream servers the pool can hand requests to.
//!
//! [`Backend`] is the capability set the selector works against. The only
//! variant today is [`HttpBackend`], a plain HTTP(S) upstream addressed by a
//! base url. Liveness is never probed from here; something outside the pool
//! flips it through [`HttpBackend::set_alive`].

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use actix_web::{web::Bytes, HttpRequest, HttpResponse};
use async_trait::async_trait;
use awc::Client;
use log::{debug, warn};
use url::Url;

use crate::error::{ConfigError, LbError, Result};
use crate::req::{create_forward_url, create_forwarded_req};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait(?Send)]
pub trait Backend: Send + Sync {
    fn address(&self) -> &str;

    fn is_alive(&self) -> bool;

    /// Remaining capacity before the backend stops counting as free.
    fn weight(&self) -> u32;

    fn is_free(&self) -> bool {
        self.weight() > 0
    }

    /// Restore the configured capacity.
    fn replenish(&self);

    /// Takes one unit of capacity. `false` when there is none left.
    fn reserve(&self) -> bool;

    /// Proxy `req` to this backend without touching capacity.
    async fn proxy(&self, client: &Client, req: &HttpRequest, body: Bytes)
        -> Result<HttpResponse>;

    /// Spend one unit of capacity and proxy `req` to this backend.
    async fn forward(
        &self,
        client: &Client,
        req: &HttpRequest,
        body: Bytes,
    ) -> Result<HttpResponse> {
        if !self.reserve() {
            debug!("{} forwarded with no capacity left", self.address());
        }
        self.proxy(client, req, body).await
    }
}

#[derive(Debug)]
pub struct HttpBackend {
    address: String,
    url: Url,
    alive: AtomicBool,
    weight: AtomicU32,
    initial_weight: u32,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(address: &str, weight: u32) -> std::result::Result<HttpBackend, ConfigError> {
        let url = Url::parse(address).map_err(|source| ConfigError::InvalidAddress {
            address: address.to_string(),
            source,
        })?;

        match url.scheme() {
            "http" | "https" => {}
            _ => {
                return Err(ConfigError::UnsupportedScheme {
                    address: address.to_string(),
                })
            }
        }
        if weight == 0 {
            return Err(ConfigError::ZeroWeight {
                address: address.to_string(),
            });
        }

        Ok(HttpBackend {
            address: address.to_string(),
            url,
            alive: AtomicBool::new(true),
            weight: AtomicU32::new(weight),
            initial_weight: weight,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> HttpBackend {
        self.timeout = timeout;
        self
    }

    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Release);
    }
}

#[async_trait(?Send)]
impl Backend for HttpBackend {
    fn address(&self) -> &str {
        &self.address
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn weight(&self) -> u32 {
        self.weight.load(Ordering::Acquire)
    }

    fn replenish(&self) {
        self.weight.store(self.initial_weight, Ordering::Release);
    }

    fn reserve(&self) -> bool {
        self.weight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |w| w.checked_sub(1))
            .is_ok()
    }

    async fn proxy(
        &self,
        client: &Client,
        req: &HttpRequest,
        body: Bytes,
    ) -> Result<HttpResponse> {
        let new_url = create_forward_url(&self.url, req.uri());
        let res = create_forwarded_req(client, req.head(), &new_url)
            .timeout(self.timeout)
            .send_body(body)
            .await
            .map_err(|err| {
                warn!("request to {} failed: {}", new_url, err);
                LbError::UpstreamUnreachable {
                    address: self.address.clone(),
                    reason: err.to_string(),
                }
            })?;

        let mut client_resp = HttpResponse::build(res.status());
        // Remove `Connection` as per
        // https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/Connection#Directives
        for (header_name, header_value) in res.headers().iter().filter(|(h, _)| *h != "connection") {
            client_resp.append_header((header_name.clone(), header_value.clone()));
        }

        Ok(client_resp.streaming(res))
    }
}
