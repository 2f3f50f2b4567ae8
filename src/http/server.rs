//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a single catch-all handler
//! - Wire up middleware (tracing)
//! - Bind server to listener
//! - Hand every request to the dispatcher
//! - Run the active health monitor alongside the server

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::BalancerConfig;
use crate::health::HealthMonitor;
use crate::http::client::build_client;
use crate::load_balancer::{dispatcher::Dispatcher, pool::BackendPool, backend::BackendError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP listener front-end of the load balancer.
pub struct HttpServer {
    router: Router,
    dispatcher: Arc<Dispatcher>,
    monitor: Option<HealthMonitor>,
}

impl HttpServer {
    /// Build the backend pool and server from configuration.
    ///
    /// Fails if any backend address is malformed.
    pub fn new(config: BalancerConfig) -> Result<Self, BackendError> {
        let client = build_client();
        let pool = BackendPool::from_config(&config.backends, &config.health_check, &client)?;
        let (backends, monitor) = pool.into_parts();

        let dispatcher = Arc::new(Dispatcher::new(backends, client));
        let mut server = Self::from_dispatcher(dispatcher);
        server.monitor = monitor;
        Ok(server)
    }

    /// Serve with a prebuilt dispatcher (no health monitor).
    pub fn from_dispatcher(dispatcher: Arc<Dispatcher>) -> Self {
        let state = AppState {
            dispatcher: dispatcher.clone(),
        };
        Self {
            router: Self::build_router(state),
            dispatcher,
            monitor: None,
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.dispatcher.len(),
            "Serving requests"
        );

        if let Some(monitor) = self.monitor {
            tokio::spawn(monitor.run(shutdown.resubscribe()));
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every method and path goes to the dispatcher.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    state.dispatcher.dispatch(request, Some(peer)).await
}
