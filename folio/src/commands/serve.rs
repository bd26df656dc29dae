use folio_config::Config;
use tracing::info;

use crate::{
    email,
    environment::{ConfigProvider, Provider},
};

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let config_provider = ConfigProvider::new(&config)?;

    info!("Connecting to smtp relay");
    let email = email::connect(
        config_provider.email_service_config.clone(),
        config.email.from.clone(),
    )
    .await?;

    let provider = Provider::new(config_provider, email);
    let server = provider.rest_server()?;
    info!("Starting http server on {}", config.http.address);
    server.serve().await
}
