use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use axum::{extract::DefaultBodyLimit, Router};
use folio_core_contact_contracts::ContactService;
use folio_utils::Apply;
use tokio::net::TcpListener;
use tracing::info;

mod errors;
mod extractors;
mod middlewares;
mod models;
mod routes;

#[derive(Debug, Clone)]
pub struct RestServer<Contact> {
    config: RestServerConfig,
    contact: Contact,
}

#[derive(Debug, Clone)]
pub struct RestServerConfig {
    pub addr: SocketAddr,
    pub real_ip_config: Option<Arc<RealIpConfig>>,
    /// Upper bound for reading and parsing a request body.
    pub body_timeout: Duration,
    pub body_limit: usize,
    /// Where to send the browser after a successful submission.
    pub redirect_url: Arc<str>,
}

#[derive(Debug, Clone)]
pub struct RealIpConfig {
    pub header: String,
    pub set_from: IpAddr,
}

impl<Contact> RestServer<Contact>
where
    Contact: ContactService,
{
    pub fn new(config: RestServerConfig, contact: Contact) -> Self {
        Self { config, contact }
    }

    /// Serve the api until ctrl+c is received.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = self.config.addr;
        let router = self.router();

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {addr}"))?;
        info!("Listening on {}", listener.local_addr()?);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to run HTTP server")
    }

    pub fn router(self) -> Router<()> {
        let RestServerConfig {
            real_ip_config,
            body_timeout,
            body_limit,
            redirect_url,
            ..
        } = self.config;

        Router::new()
            .merge(routes::contact::router(
                Arc::new(self.contact),
                body_timeout,
                redirect_url,
            ))
            .fallback(routes::not_found)
            .layer(DefaultBodyLimit::max(body_limit))
            .pipe(middlewares::panic_handler::add)
            .pipe(middlewares::trace::add)
            .pipe(middlewares::client_ip::add(real_ip_config))
            .pipe(middlewares::request_id::add)
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl+c: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests;
