//! Client address extraction
//!
//! The rate limiter keys on the caller's network address. Forwarding headers are only
//! believed when the deployment declares trusted proxies (`TRUSTED_PROXY_COUNT`).

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use melody_core::ClientIdentifier;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::state::AppState;

const UNKNOWN_ADDRESS: &str = "unknown";

/// Hashed identity of the caller. The raw address is dropped after hashing.
#[derive(Clone, Debug)]
pub struct ClientIdentity(pub ClientIdentifier);

impl FromRequestParts<Arc<AppState>> for ClientIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let address = client_address(&parts.headers, peer, state.config.trusted_proxy_count());
        Ok(ClientIdentity(ClientIdentifier::from_address(&address)))
    }
}

/// Raw address of the client.
///
/// With `trusted_proxy_count` N > 0, each trusted proxy appended the address it
/// received the request from to `X-Forwarded-For`, so the client is the Nth entry
/// from the right. `X-Real-IP` is used when there is no usable forwarding chain. With
/// no trusted proxies, or no usable header, the socket peer is the client.
pub fn client_address(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    if trusted_proxy_count > 0 {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| from_forwarded_for(v, trusted_proxy_count));
        if let Some(ip) = forwarded {
            return ip.to_string();
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if let Some(ip) = real_ip {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string())
}

fn from_forwarded_for(header_value: &str, trusted_proxy_count: usize) -> Option<IpAddr> {
    let hops: Vec<&str> = header_value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    // A chain shorter than the proxy count was not written by our proxies
    let index = hops.len().checked_sub(trusted_proxy_count)?;
    hops.get(index)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn peer() -> Option<SocketAddr> {
        Some("10.1.1.1:52000".parse().unwrap())
    }

    #[test]
    fn test_forwarding_headers_ignored_without_trusted_proxies() {
        let headers = headers(&[("x-forwarded-for", "1.2.3.4"), ("x-real-ip", "5.6.7.8")]);
        assert_eq!(client_address(&headers, peer(), 0), "10.1.1.1");
    }

    #[test]
    fn test_single_trusted_proxy_uses_last_entry() {
        let headers = headers(&[("x-forwarded-for", "6.6.6.6, 203.0.113.7")]);
        assert_eq!(client_address(&headers, peer(), 1), "203.0.113.7");
    }

    #[test]
    fn test_two_trusted_proxies() {
        let headers = headers(&[("x-forwarded-for", "6.6.6.6, 203.0.113.7, 10.0.0.2")]);
        assert_eq!(client_address(&headers, peer(), 2), "203.0.113.7");
    }

    #[test]
    fn test_short_chain_falls_back_to_peer() {
        let headers = headers(&[("x-forwarded-for", "203.0.113.7")]);
        assert_eq!(client_address(&headers, peer(), 2), "10.1.1.1");
    }

    #[test]
    fn test_invalid_entry_falls_back_to_real_ip() {
        let headers = headers(&[("x-forwarded-for", "garbage"), ("x-real-ip", " 198.51.100.4 ")]);
        assert_eq!(client_address(&headers, peer(), 1), "198.51.100.4");
    }

    #[test]
    fn test_ipv6_entry() {
        let headers = headers(&[("x-forwarded-for", "2001:db8::1")]);
        assert_eq!(client_address(&headers, None, 1), "2001:db8::1");
    }

    #[test]
    fn test_no_source_is_unknown() {
        assert_eq!(client_address(&HeaderMap::new(), None, 0), "unknown");
    }
}
