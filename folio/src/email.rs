use anyhow::Context;
use folio_email_contracts::EmailService;
use folio_email_impl::{EmailServiceConfig, EmailServiceImpl};
use folio_models::email_address::EmailAddressWithName;

/// Connect to the SMTP relay
pub async fn connect(
    config: EmailServiceConfig,
    from: EmailAddressWithName,
) -> anyhow::Result<EmailServiceImpl> {
    let email = EmailServiceImpl::new(config, from)?;
    email
        .ping()
        .await
        .context("Failed to connect to SMTP relay")?;
    Ok(email)
}
