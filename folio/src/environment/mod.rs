use std::sync::Arc;

use anyhow::{bail, Context};
use folio_api_rest::{RealIpConfig, RestServerConfig};
use folio_config::Config;
use folio_core_contact_impl::{ContactServiceConfig, ContactServiceImpl};
use folio_email_impl::{EmailServiceConfig, SmtpCredentials, SmtpSecurity};
use folio_extern_impl::{
    http::HttpClient,
    turnstile::{TurnstileApiServiceConfig, TurnstileApiServiceImpl},
};
use folio_shared_impl::captcha::{
    CaptchaServiceConfig, CaptchaServiceImpl, TurnstileCaptchaServiceConfig,
};
use types::{Email, RestServer};

pub mod types;

/// Everything that can be derived from the configuration alone
#[derive(Debug, Clone)]
pub struct ConfigProvider {
    pub rest_server_config: RestServerConfig,
    pub email_service_config: EmailServiceConfig,
    pub turnstile_api_service_config: TurnstileApiServiceConfig,
    pub captcha_service_config: CaptchaServiceConfig,
    pub contact_service_config: ContactServiceConfig,
}

impl ConfigProvider {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        // API
        let rest_server_config = RestServerConfig {
            addr: config.http.address,
            real_ip_config: config.http.real_ip.as_ref().map(|real_ip_config| {
                Arc::new(RealIpConfig {
                    header: real_ip_config.header.clone(),
                    set_from: real_ip_config.set_from,
                })
            }),
            body_timeout: *config.http.body_timeout,
            body_limit: config.http.body_limit,
            redirect_url: config.contact.redirect_url.as_str().into(),
        };

        // Email
        let credentials = match (&config.email.username, &config.email.password) {
            (Some(username), Some(password)) => Some(SmtpCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            (None, None) => None,
            _ => bail!("email.username and email.password must be set together"),
        };

        let email_service_config = EmailServiceConfig {
            host: config.email.host.clone(),
            port: config.email.port,
            security: match config.email.security {
                folio_config::SmtpSecurity::Tls => SmtpSecurity::Tls,
                folio_config::SmtpSecurity::Starttls => SmtpSecurity::StartTls,
                folio_config::SmtpSecurity::None => SmtpSecurity::None,
            },
            credentials,
            connect_timeout: *config.email.connect_timeout,
            send_timeout: *config.email.send_timeout,
        };

        // Extern
        let turnstile_api_service_config = TurnstileApiServiceConfig::new(
            config.turnstile.siteverify_endpoint_override.clone(),
        );

        // Shared
        let captcha_service_config = if config.turnstile.enable {
            let secret = config
                .turnstile
                .secret
                .as_deref()
                .filter(|secret| !secret.trim().is_empty())
                .context("turnstile.secret is required when turnstile is enabled")?;
            CaptchaServiceConfig::Turnstile(TurnstileCaptchaServiceConfig {
                secret: secret.into(),
                timeout: *config.turnstile.timeout,
            })
        } else {
            CaptchaServiceConfig::Disabled
        };

        // Core
        let contact_service_config = ContactServiceConfig {
            recipient: config.contact.recipient.clone().into(),
            send_retries: config.contact.send_retries,
            retry_delay: *config.contact.retry_delay,
        };

        Ok(Self {
            rest_server_config,
            email_service_config,
            turnstile_api_service_config,
            captcha_service_config,
            contact_service_config,
        })
    }
}

/// Wires the services together
#[derive(Debug, Clone)]
pub struct Provider {
    config: ConfigProvider,
    email: Email,
}

impl Provider {
    pub fn new(config: ConfigProvider, email: Email) -> Self {
        Self { config, email }
    }

    pub fn rest_server(self) -> anyhow::Result<RestServer> {
        let Self { config, email } = self;

        let turnstile_api =
            TurnstileApiServiceImpl::new(config.turnstile_api_service_config, HttpClient::new()?);
        let captcha = CaptchaServiceImpl::new(turnstile_api, config.captcha_service_config);
        let contact = ContactServiceImpl::new(captcha, email, config.contact_service_config);

        Ok(RestServer::new(config.rest_server_config, contact))
    }
}
