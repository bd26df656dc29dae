use clap::Subcommand;
use folio_config::Config;
use folio_email_contracts::{Email, EmailService};
use folio_models::email_address::EmailAddressWithName;
use tracing::info;

use crate::{email, environment::ConfigProvider};

#[derive(Debug, Subcommand)]
pub enum EmailCommand {
    /// Test email deliverability
    Test { recipient: EmailAddressWithName },
}

impl EmailCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        match self {
            EmailCommand::Test { recipient } => test(config, recipient).await,
        }
    }
}

async fn test(config: Config, recipient: EmailAddressWithName) -> anyhow::Result<()> {
    let config_provider = ConfigProvider::new(&config)?;
    let email_service = email::connect(
        config_provider.email_service_config,
        config.email.from.clone(),
    )
    .await?;

    email_service
        .send(Email {
            recipient: recipient.clone(),
            subject: "Email Deliverability Test".into(),
            body: "Email deliverability seems to be working!".into(),
            reply_to: None,
        })
        .await?;

    info!("Sent test email to {recipient}");

    Ok(())
}
