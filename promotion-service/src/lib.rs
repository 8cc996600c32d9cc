pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use service_core::middleware::{preflight_middleware, request_id_middleware};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::Config;
use services::{MongoPromotionStore, PaystackClient, PromotionStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PromotionStore>,
    pub paystack: PaystackClient,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration, backed by MongoDB.
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let mut client_options = ClientOptions::parse(config.database.url.expose_secret())
            .await
            .context("Failed to parse MongoDB connection string")?;
        client_options.app_name = Some(config.service_name.clone());

        let client =
            Client::with_options(client_options).context("Failed to create MongoDB client")?;
        let store = MongoPromotionStore::new(&client, &config.database.db_name);
        store
            .init_indexes()
            .await
            .context("Failed to initialize database indexes")?;

        Self::build_with_store(config, Arc::new(store)).await
    }

    /// Build against any store implementation. Tests inject the in-memory one.
    pub async fn build_with_store(
        config: Config,
        store: Arc<dyn PromotionStore>,
    ) -> anyhow::Result<Self> {
        let paystack = PaystackClient::new(config.paystack.clone())?;
        let state = AppState { store, paystack };

        // Method-router fallbacks keep wrong-method requests on the same
        // 404 envelope as unknown paths instead of axum's bare 405.
        let router = Router::new()
            .route(
                "/health",
                get(handlers::health_check).fallback(handlers::route_not_found),
            )
            .route(
                "/initialize-transaction",
                post(handlers::payments::initialize_transaction)
                    .fallback(handlers::route_not_found),
            )
            .route(
                "/verify-payment",
                post(handlers::payments::verify_payment).fallback(handlers::route_not_found),
            )
            .fallback(handlers::route_not_found)
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                }),
            )
            // request_id sits outside TraceLayer so generated ids reach the span
            .layer(from_fn(request_id_middleware))
            .layer(cors_layer(&config.security.allowed_origins))
            // outermost: rewrites the CORS layer's preflight 200s to bare 204s
            .layer(from_fn(preflight_middleware))
            .with_state(state);

        // Bind here rather than in run_until_stopped so port 0 resolves to the
        // real port before tests start issuing requests.
        let ip: IpAddr = config
            .server
            .host
            .parse()
            .context("PROMOTION_SERVICE_HOST must be an IP address")?;
        let addr = SocketAddr::new(ip, config.server.port);
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        tracing::info!("Listening on port {}", self.port);
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable allowed origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
