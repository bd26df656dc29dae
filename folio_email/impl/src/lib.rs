use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use folio_email_contracts::{Email, EmailSendError, EmailService};
use folio_models::email_address::EmailAddressWithName;
use folio_utils::Apply;
use lettre::{
    message::{header, MessageBuilder},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

type Transport = AsyncSmtpTransport<Tokio1Executor>;

#[derive(Debug, Clone)]
pub struct EmailServiceImpl {
    from: EmailAddressWithName,
    config: Arc<EmailServiceConfig>,
    /// Lazily built transport, shared by all requests. Its connection pool is
    /// dropped together with it whenever a send fails.
    transport: Arc<Mutex<Option<Transport>>>,
}

#[derive(Debug, Clone)]
pub struct EmailServiceConfig {
    pub host: String,
    pub port: u16,
    pub security: SmtpSecurity,
    pub credentials: Option<SmtpCredentials>,
    /// Bounds connecting and every single read or write on the socket.
    pub connect_timeout: Duration,
    /// Bounds a complete send, including connection setup.
    pub send_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    Tls,
    StartTls,
    None,
}

#[derive(Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

impl EmailServiceImpl {
    /// Validates the relay configuration without connecting. The connection
    /// is established on the first send or ping.
    pub fn new(config: EmailServiceConfig, from: EmailAddressWithName) -> anyhow::Result<Self> {
        build_transport(&config).context("Invalid smtp relay configuration")?;

        Ok(Self {
            from,
            config: config.into(),
            transport: Default::default(),
        })
    }

    /// Returns the cached transport, building a new one if the last send
    /// dropped it.
    fn transport(&self, slot: &mut Option<Transport>) -> anyhow::Result<Transport> {
        if let Some(transport) = slot {
            return Ok(transport.clone());
        }

        debug!(host = %self.config.host, port = self.config.port, "building new smtp transport");
        let transport = build_transport(&self.config)?;
        *slot = Some(transport.clone());
        Ok(transport)
    }

    fn build_message(&self, email: Email) -> anyhow::Result<Message> {
        Message::builder()
            .from(self.from.0.clone())
            .to(email.recipient.0)
            .apply_map(email.reply_to.map(|x| x.0), MessageBuilder::reply_to)
            .subject(email.subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(Into::into)
    }
}

impl EmailService for EmailServiceImpl {
    async fn send(&self, email: Email) -> Result<(), EmailSendError> {
        let message = self.build_message(email)?;
        let timeout = self.config.send_timeout;

        // The slot stays locked until the send has finished, so a connection
        // abandoned by a timeout never reaches another request's checkout.
        let mut slot = tokio::time::timeout(timeout, self.transport.lock())
            .await
            .map_err(|_| EmailSendError::Timeout)?;
        let transport = self.transport(&mut slot)?;

        let error = match tokio::time::timeout(timeout, transport.send(message)).await {
            Ok(Ok(response)) if response.is_positive() => return Ok(()),
            Ok(Ok(response)) => EmailSendError::Rejected(anyhow!(
                "smtp relay answered with {}",
                response.code()
            )),
            Ok(Err(err)) => classify(err),
            Err(_) => EmailSendError::Timeout,
        };

        warn!("failed to send email: {error}");
        invalidate(&mut slot);
        Err(error)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        let timeout = self.config.connect_timeout;

        let mut slot = tokio::time::timeout(timeout, self.transport.lock())
            .await
            .map_err(|_| anyhow!("Timed out while waiting for the smtp transport"))?;
        let transport = self.transport(&mut slot)?;

        let result = match tokio::time::timeout(timeout, transport.test_connection()).await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(anyhow!("Failed to ping smtp server")),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(anyhow!("Timed out while pinging smtp server")),
        };

        if result.is_err() {
            invalidate(&mut slot);
        }
        result
    }
}

/// Drop the cached transport together with its connection pool.
fn invalidate(slot: &mut Option<Transport>) {
    if slot.take().is_some() {
        debug!("dropped smtp transport");
    }
}

fn build_transport(config: &EmailServiceConfig) -> anyhow::Result<Transport> {
    let builder = match config.security {
        SmtpSecurity::Tls => Transport::relay(&config.host)?,
        SmtpSecurity::StartTls => Transport::starttls_relay(&config.host)?,
        SmtpSecurity::None => Transport::builder_dangerous(&config.host),
    };

    Ok(builder
        .port(config.port)
        .timeout(Some(config.connect_timeout))
        .apply_map(config.credentials.clone(), |builder, credentials| {
            builder.credentials(Credentials::new(credentials.username, credentials.password))
        })
        .build())
}

/// Permanent (5xx) replies and client side errors are final, everything else
/// (network errors, 4xx replies) may go away on its own.
fn classify(err: lettre::transport::smtp::Error) -> EmailSendError {
    if err.is_timeout() {
        EmailSendError::Timeout
    } else if err.is_permanent() {
        EmailSendError::Rejected(err.into())
    } else if err.is_client() {
        EmailSendError::Other(err.into())
    } else {
        EmailSendError::Transient(err.into())
    }
}
