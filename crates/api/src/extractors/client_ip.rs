//! Client identity extractor.
//!
//! Derives the rate-limit key and the best-effort network facts recorded on a
//! registration. Proxy headers are trusted when they carry an IP address, so
//! the identity is only as reliable as the reverse proxy in front of the
//! service.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use domain::services::{SubmissionContext, UNKNOWN_CLIENT};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";
pub const CF_CONNECTING_IP: &str = "cf-connecting-ip";

/// Caller identity gathered from request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Rate-limit key. `"unknown"` when no origin header is present.
    pub client_id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientIdentity {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip_address = client_ip(headers);
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            client_id: ip_address
                .clone()
                .unwrap_or_else(|| UNKNOWN_CLIENT.to_string()),
            ip_address,
            user_agent,
        }
    }

    pub fn submission_context(&self) -> SubmissionContext {
        SubmissionContext {
            client_id: self.client_id.clone(),
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Parses a header entry as an address, accepting an optional port.
fn parse_ip(value: &str) -> Option<IpAddr> {
    let value = value.trim();
    value
        .parse::<IpAddr>()
        .or_else(|_| value.parse::<SocketAddr>().map(|addr| addr.ip()))
        .ok()
}

/// First entry of `X-Forwarded-For`, then `X-Real-IP`, then
/// `CF-Connecting-IP`. Values that are not IP addresses are skipped.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let header_value = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header_value(X_FORWARDED_FOR)
        .and_then(|list| list.split(',').next())
        .and_then(parse_ip)
        .or_else(|| header_value(X_REAL_IP).and_then(parse_ip))
        .or_else(|| header_value(CF_CONNECTING_IP).and_then(parse_ip))
        .map(|ip| ip.to_string())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIdentity::from_headers(&parts.headers))
    }
}
