//! HTTP server with the middleware stack and graceful shutdown

use axum::{response::IntoResponse, Router};
use std::any::Any;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{
    config::Config,
    error::Result,
    handlers::ApiError,
    middleware::{request_id_layer, request_id_propagation_layer, sensitive_headers_layer},
};

pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Wrap `app` in the configured middleware stack
    pub fn layered(&self, app: Router) -> Router {
        let request_id_header = self.config.middleware.request_id_header.as_str();

        let app = app
            .layer(self.build_cors_layer())
            .layer(TimeoutLayer::with_status_code(
                http::StatusCode::REQUEST_TIMEOUT,
                self.config.timeout(),
            ))
            .layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes()));

        let app = if self.config.middleware.compression {
            app.layer(CompressionLayer::new())
        } else {
            app
        };

        let app = app
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(true))
                    .on_response(DefaultOnResponse::new().include_headers(true)),
            )
            .layer(sensitive_headers_layer())
            .layer(request_id_propagation_layer(request_id_header))
            .layer(request_id_layer(request_id_header));

        if self.config.middleware.catch_panic {
            app.layer(CatchPanicLayer::custom(panic_response))
        } else {
            app
        }
    }

    pub async fn serve(self, app: Router) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.service.port));
        tracing::info!(service = %self.config.service.name, %addr, "starting");
        self.log_middleware_config();

        let app = self.layered(app);

        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(%addr, "listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("shutdown complete");
        Ok(())
    }

    fn log_middleware_config(&self) {
        let middleware = &self.config.middleware;
        tracing::info!(
            catch_panic = middleware.catch_panic,
            request_id_header = %middleware.request_id_header,
            body_limit_mb = middleware.body_limit_mb,
            compression = middleware.compression,
            cors_mode = %middleware.cors_mode,
            timeout_secs = self.config.service.timeout_secs,
            "middleware configured"
        );
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `permissive` (and anything unrecognised) allows any origin;
    /// `restrictive` and `disabled` answer no CORS headers at all
    fn build_cors_layer(&self) -> CorsLayer {
        let mode = self.config.middleware.cors_mode.as_str();
        match mode {
            "restrictive" | "disabled" => CorsLayer::new(),
            "permissive" => CorsLayer::permissive(),
            other => {
                tracing::warn!(cors_mode = other, "unknown CORS mode, using permissive");
                CorsLayer::permissive()
            }
        }
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    ApiError::internal("An internal error occurred")
        .with_detail(format!("handler panicked: {detail}"))
        .into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    };
    tracing::info!(signal = received, "draining in-flight requests");
}
