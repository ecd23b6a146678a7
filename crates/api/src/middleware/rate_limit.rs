//! Per-client rate limiting for the public invitation endpoints.
//!
//! Link tokens are bearer credentials, so preview and redemption are
//! throttled by client IP to slow down token guessing.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter as GovRateLimiter,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;

use crate::app::AppState;
use crate::error::ApiError;

type IpRateLimiter = GovRateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Rate limiter shared across all requests, keyed by client IP.
pub struct RateLimiterState {
    limiter: IpRateLimiter,
    clock: DefaultClock,
    rate_limit_per_minute: u32,
    trusted_proxies: Vec<IpAddr>,
}

impl RateLimiterState {
    /// Returns `None` when the limit is zero (rate limiting disabled).
    ///
    /// Forwarding headers are only honoured on connections from
    /// `trusted_proxies`.
    pub fn new(rate_limit_per_minute: u32, trusted_proxies: Vec<IpAddr>) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self {
            limiter: GovRateLimiter::keyed(Quota::per_minute(per_minute)),
            clock: DefaultClock::default(),
            rate_limit_per_minute,
            trusted_proxies,
        })
    }

    /// Client address of a request arriving from `peer`.
    pub fn client_ip(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
        client_ip(headers, peer, &self.trusted_proxies)
    }

    /// `Ok(())` if allowed, otherwise the number of seconds to wait.
    pub fn check(&self, client: IpAddr) -> Result<(), u64> {
        self.limiter.check_key(&client).map_err(|not_until| {
            not_until
                .wait_time_from(self.clock.now())
                .as_secs()
                .max(1)
        })
    }

    /// Drops state for clients that are back under their quota.
    pub fn prune(&self) {
        self.limiter.retain_recent();
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("trusted_proxies", &self.trusted_proxies)
            .field("tracked_clients", &self.limiter.len())
            .finish()
    }
}

/// Client IP of a request. The socket peer is authoritative unless it is a
/// trusted proxy; then the nearest untrusted `X-Forwarded-For` hop is used,
/// falling back to `X-Real-IP`.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trusted: &[IpAddr]) -> IpAddr {
    let Some(peer) = peer.map(|addr| addr.ip()) else {
        return IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    };
    if !trusted.contains(&peer) {
        return peer;
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let hops: Vec<IpAddr> = v
                .split(',')
                .map(|hop| hop.trim().parse().ok())
                .collect::<Option<_>>()?;
            hops.iter()
                .rev()
                .find(|hop| !trusted.contains(hop))
                .or_else(|| hops.first())
                .copied()
        });

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    };

    forwarded.or_else(real_ip).unwrap_or(peer)
}

/// Rejects requests over the per-client quota with 429 and `Retry-After`.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return next.run(req).await;
    };

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = limiter.client_ip(req.headers(), peer);

    if let Err(retry_after) = limiter.check(ip) {
        tracing::warn!(client_ip = %ip, retry_after, "Rate limit exceeded");
        let mut response = ApiError::RateLimited.into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        return response;
    }

    next.run(req).await
}
