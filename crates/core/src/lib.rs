//! Crate for bunny-proxy, a pass-through proxy for the bunny.net API.
//!
//! Every exposed route maps onto exactly one vendor endpoint. Requests are forwarded
//! with the configured account key (or the owning library's key for video library routes)
//! and the vendor's status code is answered using the route's declared responses.

#[cfg(feature = "rustls-tls")]
#[cfg(feature = "native-tls")]
compile_error!("You can only enable one TLS backend");

pub extern crate url;

mod forwarder;
mod http_client;
mod routes;

use anyhow::{Result, ensure};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, StatusCode, header},
    middleware::{self as axum_middleware, Next},
    response::Response,
    routing::get,
};
use forwarder::Forwarder;
use http_client::{BuildHttpClientArgs, build_http_client};
use reqwest::Proxy;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};
use tower_http::{
    catch_panic::CatchPanicLayer,
    timeout::TimeoutLayer,
    trace::{self, TraceLayer},
};
use tracing::{Level, info};
use url::Url;

/// Base URL of the vendor's account-wide API.
pub const DEFAULT_ACCOUNT_API_URL: &str = "https://api.bunny.net";

/// Base URL of the vendor's video library API.
pub const DEFAULT_STREAM_API_URL: &str = "https://video.bunnycdn.com";

/// # Example
/// ```rust,no_run
/// use std::net::{SocketAddr, IpAddr, Ipv4Addr};
/// use bunny_proxy::{BunnyProxyServer, BunnyProxyServerSettings, VendorSettings};
///
/// # #[tokio::main]
/// # async fn main() {
/// let server = BunnyProxyServer::new(BunnyProxyServerSettings {
///     vendor_settings: VendorSettings {
///         account_key: "my-account-key".to_owned(),
///         ..Default::default()
///     },
///     ..Default::default()
/// })
/// .unwrap();
/// server.start(&SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 5001)).await.unwrap();
/// # }
/// ```
#[derive(Debug)]
pub struct BunnyProxyServer {
    router_inner: Router,
}

/// Settings to run the proxy server with.
#[derive(Debug, Clone)]
pub struct BunnyProxyServerSettings {
    /// How long an incoming request may take before it is abandoned.
    pub request_timeout: Duration,

    /// The largest request body (in bytes) that will be accepted and forwarded.
    pub max_body_size: usize,

    /// See [`UpstreamSettings`].
    pub upstream_settings: UpstreamSettings,

    /// See [`VendorSettings`].
    pub vendor_settings: VendorSettings,
}

/// Configuration options used when making any call to the vendor regardless of route.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    /// Whether to allow invalid/expired/forged TLS certificates when making upstream requests.
    ///
    /// **Enabling this is dangerous and is usually not necessary.**
    pub allow_invalid_certs: bool,

    /// How long a request to the vendor may take before it's abandoned and considered failed.
    pub request_timeout: Duration,

    /// The maximum amount of redirects to follow when making a request to the vendor before abandoning the request.
    pub max_redirects: usize,

    /// The proxy to use for all outgoing requests.
    pub request_proxy: Option<Url>,
}

/// Credentials and endpoints of the vendor API.
#[derive(Clone)]
pub struct VendorSettings {
    /// Account-wide access key, sent as the `AccessKey` header.
    pub account_key: String,

    /// Base URL of the account API.
    pub account_api_url: Url,

    /// Base URL of the video library (stream) API.
    pub stream_api_url: Url,
}

impl std::fmt::Debug for VendorSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorSettings")
            .field("account_key", &"<redacted>")
            .field("account_api_url", &self.account_api_url)
            .field("stream_api_url", &self.stream_api_url)
            .finish()
    }
}

impl Default for BunnyProxyServerSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_body_size: 10_000_000,
            upstream_settings: UpstreamSettings::default(),
            vendor_settings: VendorSettings::default(),
        }
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            allow_invalid_certs: false,
            request_timeout: Duration::from_secs(15),
            max_redirects: 5,
            request_proxy: None,
        }
    }
}

impl Default for VendorSettings {
    fn default() -> Self {
        Self {
            account_key: String::new(),
            account_api_url: Url::parse(DEFAULT_ACCOUNT_API_URL)
                .expect("default account api url should be valid"),
            stream_api_url: Url::parse(DEFAULT_STREAM_API_URL)
                .expect("default stream api url should be valid"),
        }
    }
}

#[derive(Debug)]
struct AppState {
    forwarder: Forwarder,
}

impl BunnyProxyServer {
    /// Create a new server with the provided settings.
    pub fn new(settings: BunnyProxyServerSettings) -> Result<Self> {
        ensure!(
            !settings.vendor_settings.account_key.is_empty(),
            "an account key is required to talk to the vendor API"
        );

        let client = build_http_client(BuildHttpClientArgs {
            allow_invalid_certs: settings.upstream_settings.allow_invalid_certs,
            max_redirects: settings.upstream_settings.max_redirects,
            request_timeout: settings.upstream_settings.request_timeout,
            proxy: settings
                .upstream_settings
                .request_proxy
                .as_ref()
                .map(|p| Proxy::all(p.as_str()))
                .transpose()?,
        })?;
        let VendorSettings {
            account_key,
            account_api_url,
            stream_api_url,
        } = settings.vendor_settings;

        let router = Router::new()
            .route("/", get(routes::index_handler))
            .route("/health", get(routes::health_handler))
            .route(
                "/library/{libraryId}/videos/{videoId}/signature",
                get(routes::upload_signature_handler),
            )
            .merge(routes::vendor_routes())
            .layer(DefaultBodyLimit::max(settings.max_body_size))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                settings.request_timeout,
            ))
            .layer(CatchPanicLayer::new())
            .layer(axum_middleware::from_fn(Self::header_middleware))
            .with_state(Arc::new(AppState {
                forwarder: Forwarder::new(client, account_key, account_api_url, stream_api_url),
            }));

        Ok(Self {
            router_inner: router,
        })
    }

    /// Consume the server and return its [`Router`] without binding to a socket.
    pub fn into_router(self) -> Router {
        self.router_inner
    }

    /// Start the server and expose it locally on the provided [`SocketAddr`].
    pub async fn start(self, address: &SocketAddr) -> Result<()> {
        let tcp_listener = TcpListener::bind(&address).await?;
        info!("Listening on http://{}", tcp_listener.local_addr()?);
        axum::serve(tcp_listener, self.router_inner)
            .with_graceful_shutdown(Self::shutdown_signal())
            .await?;
        Ok(())
    }

    // https://github.com/tokio-rs/axum/blob/15917c6dbcb4a48707a20e9cfd021992a279a662/examples/graceful-shutdown/src/main.rs#L55
    async fn shutdown_signal() {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    async fn header_middleware(request: Request, next: Next) -> Response {
        let mut response = next.run(request).await;
        response.headers_mut().append(
            header::SERVER,
            HeaderValue::from_static(env!("CARGO_PKG_NAME")),
        );
        response
    }
}
