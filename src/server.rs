//! HTTP server setup and lifecycle management.
//!
//! Plain HTTP/1.1 on a tokio listener, one task per connection. TLS is left
//! to whatever reverse proxy sits in front of Filestash.

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::bridge::LoginBridge;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::logging::LoggingSpanner;
use crate::web::handlers::BridgeHandler;
use crate::web::service::BridgeService;

/// Main server struct holding the validated configuration.
pub struct Server {
    config: Arc<BridgeConfig>,
}

impl Server {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The outbound client shared by every pipeline stage.
    ///
    /// Redirects are not followed so the session endpoint's own `Set-Cookie` is what we see.
    pub fn http_client(config: &BridgeConfig) -> Result<reqwest::Client, BridgeError> {
        reqwest::Client::builder()
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| {
                BridgeError::Configuration(format!("Failed to build HTTP client: {err}"))
            })
    }

    /// Builds the request-handling service, without binding anything.
    pub fn service(&self) -> Result<BridgeService, BridgeError> {
        let http = Self::http_client(&self.config)?;
        let bridge = Arc::new(LoginBridge::new(&self.config, http));
        let handler = Arc::new(BridgeHandler::new(bridge, &self.config.prefix));
        Ok(BridgeService::new(handler))
    }

    pub async fn run(self) -> Result<(), BridgeError> {
        let addr = format!("{}:{}", self.config.bind_address, self.config.port);
        let addr: SocketAddr = addr.parse().map_err(|err| {
            BridgeError::Configuration(format!("Failed to parse address '{addr}': {err}"))
        })?;
        let listener = TcpListener::bind(addr).await?;
        self.run_with_listener(listener).await
    }

    /// Serves on an already-bound listener; tests bind port 0 and pass it in.
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), BridgeError> {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(LoggingSpanner)
            .on_response(LoggingSpanner);
        let service = ServiceBuilder::new()
            .layer(trace_layer)
            .service(self.service()?);

        info!(
            address = %listener.local_addr()?,
            login_path = %self.config.login_path(),
            callback_path = %self.config.callback_path(),
            redirect_uri = %self.config.redirect_uri,
            discovery_url = %self.config.discovery_url,
            storage_endpoint = %self.config.storage_endpoint,
            session_endpoint = %self.config.session_endpoint,
            request_timeout = ?self.config.request_timeout,
            "Starting filestash-oidc-bridge..."
        );

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            debug!(remote_addr = %remote_addr, "Accepted new connection");

            let io = TokioIo::new(stream);
            let service = TowerToHyperService::new(service.clone());

            tokio::task::spawn(async move {
                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    debug!(error = %err, remote_addr = %remote_addr, "Error serving connection");
                }
            });
        }
    }
}
