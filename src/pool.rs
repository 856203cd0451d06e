//! Weighted round-robin selection over a fixed set of backends.
//!
//! A pick starts from the round-robin seed at `cursor % len` and only moves
//! off it for a live backend with strictly more capacity left, so equal
//! weights keep plain rotation order. A seed that is down or exhausted is
//! replaced by walking the cursor forward, at most once around the pool.
//!
//! Exhausted backends are never handed out while a live backend still has
//! capacity. Once every live backend is exhausted the whole pool is replenished
//! to its configured weights and a new round starts.
//!
//! The pick takes its unit of capacity while the cursor lock is held, so
//! requests picked together never share the last unit of a backend.

use std::ops::Deref;
use std::sync::{Arc, Mutex};

use actix_web::{web::Bytes, HttpRequest, HttpResponse};
use awc::Client;
use log::{error, info};

use crate::backend::Backend;
use crate::error::{LbError, Result};

/// A backend whose unit of capacity is already spent for one request.
pub struct Picked {
    backend: Arc<dyn Backend>,
}

impl Picked {
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Proxies the request the capacity was reserved for.
    pub async fn forward(
        self,
        client: &Client,
        req: &HttpRequest,
        body: Bytes,
    ) -> Result<HttpResponse> {
        self.backend.proxy(client, req, body).await
    }
}

impl Deref for Picked {
    type Target = dyn Backend;

    fn deref(&self) -> &Self::Target {
        self.backend.as_ref()
    }
}

pub struct Pool {
    backends: Vec<Arc<dyn Backend>>,
    cursor: Mutex<usize>,
}

fn is_usable(backend: &dyn Backend) -> bool {
    backend.is_alive() && backend.is_free()
}

impl Pool {
    pub fn new(backends: Vec<Arc<dyn Backend>>) -> Pool {
        Pool {
            backends,
            cursor: Mutex::new(0),
        }
    }

    pub fn backends(&self) -> &[Arc<dyn Backend>] {
        &self.backends
    }

    pub fn pick_backend(&self) -> Result<Picked> {
        let length = self.backends.len();
        if length == 0 {
            return Err(LbError::NoBackendsConfigured);
        }

        // the cursor is a plain counter, a panicking holder can't leave it torn
        let mut cursor = self
            .cursor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let any_alive = self.backends.iter().any(|b| b.is_alive());
        if any_alive && !self.backends.iter().any(|b| is_usable(b.as_ref())) {
            self.replenish();
        }

        let mut candidate = *cursor % length;
        for (index, backend) in self.backends.iter().enumerate() {
            if is_usable(backend.as_ref()) && backend.weight() > self.backends[candidate].weight() {
                candidate = index;
            }
        }

        let mut attempts = 1;
        let mut first_alive = None;
        while !is_usable(self.backends[candidate].as_ref()) {
            if first_alive.is_none() && self.backends[candidate].is_alive() {
                first_alive = Some(candidate);
            }
            if attempts == length {
                match first_alive {
                    // capacity was spent outside the pool
                    Some(index) => {
                        self.replenish();
                        candidate = index;
                        break;
                    }
                    None => {
                        error!("all {} backends are down", length);
                        return Err(LbError::NoLiveBackend { attempts });
                    }
                }
            }
            *cursor = cursor.wrapping_add(1);
            candidate = *cursor % length;
            attempts += 1;
        }

        *cursor = cursor.wrapping_add(1);
        let backend = self.backends[candidate].clone();
        backend.reserve();
        Ok(Picked { backend })
    }

    fn replenish(&self) {
        info!("every live backend is exhausted, replenishing weights");
        for backend in &self.backends {
            backend.replenish();
        }
    }
}
