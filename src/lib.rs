//! Weighted round-robin HTTP load balancer.
//!
//! Requests come in through actix-web, [`dispatch::dispatch`] asks the
//! [`pool::Pool`] for a backend and the backend proxies the request upstream
//! with awc.

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod pool;
pub mod req;

#[cfg(test)]
mod test_util;
