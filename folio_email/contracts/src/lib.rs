use std::future::Future;

use folio_models::email_address::EmailAddressWithName;
use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait EmailService: Send + Sync + 'static {
    /// Deliver a single plain text email to the configured smtp relay.
    ///
    /// This is a single attempt, callers decide whether a
    /// [transient](EmailSendError::is_transient) failure is worth retrying.
    fn send(&self, email: Email) -> impl Future<Output = Result<(), EmailSendError>> + Send;

    /// Check that the smtp relay is reachable and accepts our connection.
    fn ping(&self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub recipient: EmailAddressWithName,
    pub subject: String,
    pub body: String,
    pub reply_to: Option<EmailAddressWithName>,
}

#[derive(Debug, Error)]
pub enum EmailSendError {
    #[error("Timed out while sending the email.")]
    Timeout,
    #[error("The smtp relay is unavailable: {0}")]
    Transient(anyhow::Error),
    #[error("The smtp relay rejected the email: {0}")]
    Rejected(anyhow::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EmailSendError {
    /// Whether the same email might go through if sent again shortly after.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Transient(_))
    }
}

#[cfg(feature = "mock")]
impl MockEmailService {
    pub fn with_send(self, email: Email, result: Result<(), EmailSendError>) -> Self {
        self.with_send_results(email, vec![result])
    }

    /// Expect `email` to be sent exactly `results.len()` times, answering the
    /// calls with `results` in order.
    pub fn with_send_results(
        mut self,
        email: Email,
        results: Vec<Result<(), EmailSendError>>,
    ) -> Self {
        let mut results = std::collections::VecDeque::from(results);
        self.expect_send()
            .times(results.len())
            .with(mockall::predicate::eq(email))
            .returning(move |_| {
                let result = results.pop_front().unwrap();
                Box::pin(std::future::ready(result))
            });
        self
    }
}
