use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::sink::{
    CalibrationSource, LogSink, PublishSink, SinkError, StellariumSink, StellariumView,
};
use crate::source::run_device_reader;
use crate::tracker::{OrientationTracker, Tracker, TrackerError};

use super::api::samples as sample_handlers;
use super::api::tracker as tracker_handlers;
use super::api_doc::ApiDoc;
use super::auth::AppState;
use super::config::{Config, ConfigError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("viewer client error: {0}")]
    Sink(#[from] SinkError),
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),
}

pub fn build_tracker(config: &Config) -> Result<Tracker, ServerError> {
    let settings = config.tracker_settings()?;

    let (sink, calibration_source) = match &config.viewer {
        Some(viewer) => {
            let timeout = viewer.timeout()?;
            log::info!("Publishing orientation to {}", viewer.url);
            let sink: Arc<dyn PublishSink> = Arc::new(StellariumSink::new(&viewer.url, timeout)?);
            let view: Arc<dyn CalibrationSource> = Arc::new(StellariumView::new(
                &viewer.url,
                timeout,
                viewer.invert_azimuth,
                settings.azimuth_range,
            )?);
            (sink, Some(view))
        }
        None => {
            log::info!("No viewer configured, orientation changes are only logged");
            let sink: Arc<dyn PublishSink> = Arc::new(LogSink);
            (sink, None)
        }
    };

    Ok(Tracker::new(
        OrientationTracker::new(settings),
        sink,
        calibration_source,
    ))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Sample ingestion
        .route("/api/samples", post(sample_handlers::submit_sample))
        .route(
            "/api/environment",
            post(sample_handlers::submit_environment).get(sample_handlers::environment),
        )
        // Tracker
        .route("/api/orientation", get(tracker_handlers::orientation))
        .route("/api/status", get(tracker_handlers::status))
        .route("/api/calibrate", post(tracker_handlers::calibrate))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let bind_addr = config.web.bind.clone();
    let tracker = Arc::new(build_tracker(&config)?);
    tracker.start()?;

    let reader = config.source.as_ref().map(|source| {
        let (stop_tx, stop_rx) = oneshot::channel();
        let device = source.device.clone();
        let tracker = tracker.clone();
        let join = tokio::spawn(async move {
            if let Err(e) = run_device_reader(&device, tracker, stop_rx).await {
                log::error!("Sample reader on {} failed: {}", device.display(), e);
            }
        });
        (stop_tx, join)
    });

    let state = AppState {
        config: Arc::new(config),
        tracker: tracker.clone(),
    };
    let app = build_router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some((stop_tx, join)) = reader {
        let _ = stop_tx.send(());
        let _ = join.await;
    }
    tracker.stop().await;

    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_tracker_without_viewer() {
        let config = Config::from_yaml("{}").unwrap();
        let tracker = build_tracker(&config).unwrap();
        assert!(!tracker.is_running());
    }

    #[test]
    fn test_build_tracker_with_viewer() {
        let config = Config::from_yaml(
            "viewer:\n  url: \"http://localhost:8090/\"\n  timeout: 250ms\n",
        )
        .unwrap();
        assert!(build_tracker(&config).is_ok());
    }

    #[test]
    fn test_build_router() {
        let config = Config::from_yaml("{}").unwrap();
        let tracker = Arc::new(build_tracker(&config).unwrap());
        let _router = build_router(AppState {
            config: Arc::new(config),
            tracker,
        });
    }
}
