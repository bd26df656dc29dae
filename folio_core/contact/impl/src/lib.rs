use std::{sync::Arc, time::Duration};

use folio_core_contact_contracts::{ContactService, ContactSubmitError};
use folio_email_contracts::{Email, EmailSendError, EmailService};
use folio_models::{contact::ContactSubmission, email_address::EmailAddressWithName};
use folio_shared_contracts::captcha::{CaptchaCheckError, CaptchaService};
use tracing::{error, info, warn};

pub const SUBJECT: &str = "New contact form submission";

#[derive(Debug, Clone)]
pub struct ContactServiceImpl<Captcha, Mailer> {
    captcha: Captcha,
    email: Mailer,
    config: ContactServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ContactServiceConfig {
    pub recipient: Arc<EmailAddressWithName>,
    /// How often a transiently failed send is retried.
    pub send_retries: u32,
    pub retry_delay: Duration,
}

impl<Captcha, Mailer> ContactServiceImpl<Captcha, Mailer> {
    pub fn new(captcha: Captcha, email: Mailer, config: ContactServiceConfig) -> Self {
        Self {
            captcha,
            email,
            config,
        }
    }
}

impl<Captcha, Mailer> ContactService for ContactServiceImpl<Captcha, Mailer>
where
    Captcha: CaptchaService,
    Mailer: EmailService,
{
    async fn submit(
        &self,
        submission: ContactSubmission,
        captcha_response: Option<String>,
    ) -> Result<(), ContactSubmitError> {
        self.captcha
            .check(captcha_response.as_deref())
            .await
            .map_err(|err| match err {
                CaptchaCheckError::Missing => ContactSubmitError::CaptchaMissing,
                CaptchaCheckError::Failed => ContactSubmitError::CaptchaFailed,
                CaptchaCheckError::Timeout => ContactSubmitError::CaptchaTimeout,
                CaptchaCheckError::Other(err) => ContactSubmitError::CaptchaUnavailable(err),
            })?;

        let email = Email {
            recipient: (*self.config.recipient).clone(),
            subject: SUBJECT.into(),
            body: format_body(&submission),
            reply_to: submission.author_mailbox(),
        };

        let mut retries_left = self.config.send_retries;
        loop {
            match self.email.send(email.clone()).await {
                Ok(()) => {
                    info!("forwarded contact form submission");
                    return Ok(());
                }
                Err(err) if err.is_transient() && retries_left > 0 => {
                    warn!(retries_left, "sending contact email failed, retrying: {err}");
                    retries_left -= 1;
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(EmailSendError::Timeout) => {
                    error!("sending contact email timed out");
                    return Err(ContactSubmitError::SendTimeout);
                }
                Err(err) => {
                    error!("failed to send contact email: {err:#}");
                    return Err(ContactSubmitError::Send);
                }
            }
        }
    }
}

fn format_body(submission: &ContactSubmission) -> String {
    format!(
        "Name: {}\nCompany: {}\nEmail: {}\nMessage: {}",
        *submission.full_name, *submission.company_name, *submission.email, *submission.message
    )
}
