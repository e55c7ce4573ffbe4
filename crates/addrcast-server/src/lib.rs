//! HTTP surface for addrcast: a single `GET /forecast` endpoint.

use std::sync::Arc;

use addrcast_core::{AppError, Config};
use addrcast_weather::{render_outcome, Address, ForecastPipeline};
use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

/// Build the router around a shared pipeline.
pub fn build_router(pipeline: Arc<ForecastPipeline>) -> Router {
    Router::new()
        .route("/forecast", get(forecast))
        .with_state(pipeline)
}

/// `GET /forecast?street=&city=&state=&zipcode=`
///
/// Answers 200 for both a forecast and a not-found address. Upstream
/// failures answer with the error's status and a short message.
async fn forecast(
    State(pipeline): State<Arc<ForecastPipeline>>,
    Query(address): Query<Address>,
) -> Response {
    match pipeline.resolve(&address).await {
        Ok(outcome) => json_response(StatusCode::OK, render_outcome(&outcome)),
        Err(e) => {
            let err = AppError::from(e);
            tracing::error!("Forecast failed for address '{}': {}", address, err);

            let status =
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let body = serde_json::json!({
                "success": false,
                "message": err.user_message(),
            });
            json_response(status, body.to_string())
        }
    }
}

fn json_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Serve on an already-bound listener until ctrl-c.
pub async fn serve_on(listener: TcpListener, pipeline: Arc<ForecastPipeline>) -> Result<()> {
    let local_addr = listener.local_addr().context("Listener has no local address")?;
    tracing::info!("Forecast service listening on {}", local_addr);

    axum::serve(listener, build_router(pipeline))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Forecast service stopped");
    Ok(())
}

/// Build the pipeline from `config`, bind `server.bind_addr` and serve.
pub async fn serve(config: &Config) -> Result<()> {
    let pipeline = ForecastPipeline::from_config(config)?;
    let listener = TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    serve_on(listener, Arc::new(pipeline)).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
