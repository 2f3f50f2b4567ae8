//! Shared upstream HTTP client.

use axum::body::Body;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

/// Client used for forwarding and health probes. Speaks plain HTTP and
/// HTTPS (webpki roots) to upstreams.
pub type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the upstream client. Connections are pooled per upstream host.
pub fn build_client() -> HttpClient {
    let https = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();

    Client::builder(TokioExecutor::new()).build(https)
}
