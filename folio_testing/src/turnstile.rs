use std::{net::IpAddr, sync::Arc};

use anyhow::Context;
use axum::{extract::State, routing, Form, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

pub const SITEVERIFY_ROUTE: &str = "/turnstile/v0/siteverify";

/// Token accepted by the fake siteverify endpoint.
pub const SUCCESS_TOKEN: &str = "success";
/// Token for which the fake siteverify endpoint never answers.
pub const HANG_TOKEN: &str = "hang";

pub async fn start_server(host: IpAddr, port: u16, secret: String) -> anyhow::Result<()> {
    info!("Starting turnstile testing server on {host}:{port}");
    info!("Turnstile siteverify endpoint: http://{host}:{port}{SITEVERIFY_ROUTE}");
    info!("Secret: {secret:?}");
    info!(
        "The response {SUCCESS_TOKEN:?} is valid, {HANG_TOKEN:?} never gets an answer and \
         everything else is rejected"
    );

    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {host}:{port}"))?;
    axum::serve(listener, router(secret))
        .await
        .context("Failed to start HTTP server")
}

/// Serve the fake endpoint on a random local port in the background and
/// return its siteverify url.
pub async fn spawn(secret: impl Into<String>) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let router = router(secret.into());
    tokio::spawn(async move { axum::serve(listener, router).await });
    Ok(format!("http://{addr}{SITEVERIFY_ROUTE}"))
}

pub fn router(secret: String) -> Router<()> {
    Router::new()
        .route(SITEVERIFY_ROUTE, routing::post(siteverify))
        .with_state(secret.into())
}

#[derive(Deserialize)]
struct SiteverifyRequest {
    secret: String,
    response: String,
}

#[derive(Serialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(rename = "error-codes")]
    error_codes: Vec<&'static str>,
}

async fn siteverify(
    state: State<Arc<str>>,
    Form(SiteverifyRequest { secret, response }): Form<SiteverifyRequest>,
) -> Json<SiteverifyResponse> {
    if response == HANG_TOKEN {
        std::future::pending::<()>().await;
    }

    let error_codes = if *secret != **state {
        vec!["invalid-input-secret"]
    } else if response != SUCCESS_TOKEN {
        vec!["invalid-input-response"]
    } else {
        vec![]
    };

    Json(SiteverifyResponse {
        success: error_codes.is_empty(),
        error_codes,
    })
}
