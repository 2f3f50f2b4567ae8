//! Request and response rewriting for single-host forwarding.
//!
//! # Responsibilities
//! - Point the request at the backend (scheme, authority, joined path/query)
//! - Strip hop-by-hop headers in both directions
//! - Record the client address in `X-Forwarded-For`
//! - Keep the client's `Host` unless the backend opts into rewriting it
//!
//! # Design Decisions
//! - Bodies are never buffered; they stream through as-is
//! - Upstream requests are always HTTP/1.1
//! - Protocol upgrades (WebSocket, h2c) are not proxied: `Upgrade` is
//!   stripped, so upstreams see a plain request
//! - Everything not listed above passes through untouched

use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::http::{
    header::{self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue},
    uri::InvalidUri,
    Request, Response, StatusCode, Version,
};
use axum::response::IntoResponse;
use hyper::body::Incoming;
use url::Url;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

const HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Failure while forwarding a request to a backend.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid upstream uri: {0}")]
    InvalidUri(#[from] InvalidUri),
    #[error("invalid upstream host header: {0}")]
    InvalidHost(#[from] InvalidHeaderValue),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
    }
}

/// Join two URL paths with exactly one slash between them.
pub fn join_path(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Combine the backend's fixed query with the request query.
pub fn join_query(base: Option<&str>, query: Option<&str>) -> Option<String> {
    let base = base.unwrap_or_default();
    let query = query.unwrap_or_default();
    let joined = if base.is_empty() || query.is_empty() {
        format!("{}{}", base, query)
    } else {
        format!("{}&{}", base, query)
    };
    (!joined.is_empty()).then_some(joined)
}

/// `host[:port]` of a backend URL, omitting the scheme's default port.
pub fn authority(target: &Url) -> String {
    let host = target.host_str().unwrap_or_default();
    match target.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, client: IpAddr) -> Result<(), InvalidHeaderValue> {
    let prior: Vec<&str> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    let value = if prior.is_empty() {
        client.to_string()
    } else {
        format!("{}, {}", prior.join(", "), client)
    };
    headers.insert(X_FORWARDED_FOR, HeaderValue::from_str(&value)?);
    Ok(())
}

/// Rewrite an inbound request so it targets `target`.
///
/// With `rewrite_host` the `Host` header is set to the backend authority;
/// otherwise the client's `Host` is forwarded as received.
pub fn rewrite_request(
    target: &Url,
    request: Request<Body>,
    peer: Option<SocketAddr>,
    rewrite_host: bool,
) -> Result<Request<Body>, ForwardError> {
    let (mut parts, body) = request.into_parts();
    let inbound_authority = parts.uri.authority().cloned();

    let authority = authority(target);
    let mut uri = format!(
        "{}://{}{}",
        target.scheme(),
        authority,
        join_path(target.path(), parts.uri.path())
    );
    if let Some(query) = join_query(target.query(), parts.uri.query()) {
        uri.push('?');
        uri.push_str(&query);
    }

    parts.uri = uri.parse()?;
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);
    if rewrite_host {
        parts.headers.insert(header::HOST, HeaderValue::from_str(&authority)?);
    } else if !parts.headers.contains_key(header::HOST) {
        // HTTP/2 clients carry the host in the URI authority instead.
        if let Some(inbound) = inbound_authority {
            parts.headers.insert(header::HOST, HeaderValue::from_str(inbound.as_str())?);
        }
    }
    if let Some(peer) = peer {
        append_forwarded_for(&mut parts.headers, peer.ip())?;
    }

    Ok(Request::from_parts(parts, body))
}

/// Turn an upstream response into one for the client.
pub fn rewrite_response(response: Response<Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}
