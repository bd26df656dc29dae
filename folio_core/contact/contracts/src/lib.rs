use std::future::Future;

use folio_models::contact::ContactSubmission;
use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactService: Send + Sync + 'static {
    /// Verify the captcha response (if captchas are enabled) and forward the
    /// submission to the contact inbox.
    fn submit(
        &self,
        submission: ContactSubmission,
        captcha_response: Option<String>,
    ) -> impl Future<Output = Result<(), ContactSubmitError>> + Send;
}

#[derive(Debug, Error)]
pub enum ContactSubmitError {
    #[error("No captcha response has been submitted.")]
    CaptchaMissing,
    #[error("The captcha check failed.")]
    CaptchaFailed,
    #[error("The captcha could not be verified in time.")]
    CaptchaTimeout,
    #[error("The captcha could not be verified.")]
    CaptchaUnavailable(anyhow::Error),
    #[error("Timed out while sending the message.")]
    SendTimeout,
    #[error("Failed to send message.")]
    Send,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockContactService {
    pub fn with_submit(
        mut self,
        submission: ContactSubmission,
        captcha_response: Option<String>,
        result: Result<(), ContactSubmitError>,
    ) -> Self {
        self.expect_submit()
            .once()
            .with(
                mockall::predicate::eq(submission),
                mockall::predicate::eq(captcha_response),
            )
            .return_once(|_, _| Box::pin(std::future::ready(result)));
        self
    }
}
