use std::{sync::Arc, time::Duration};

use folio_extern_contracts::turnstile::TurnstileApiService;
use folio_shared_contracts::captcha::{CaptchaCheckError, CaptchaService};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct CaptchaServiceImpl<TurnstileApi> {
    turnstile_api: TurnstileApi,
    config: CaptchaServiceConfig,
}

#[derive(Debug, Clone)]
pub enum CaptchaServiceConfig {
    Disabled,
    Turnstile(TurnstileCaptchaServiceConfig),
}

#[derive(Debug, Clone)]
pub struct TurnstileCaptchaServiceConfig {
    pub secret: Arc<str>,
    pub timeout: Duration,
}

impl<TurnstileApi> CaptchaServiceImpl<TurnstileApi> {
    pub fn new(turnstile_api: TurnstileApi, config: CaptchaServiceConfig) -> Self {
        Self {
            turnstile_api,
            config,
        }
    }
}

impl<TurnstileApi> CaptchaService for CaptchaServiceImpl<TurnstileApi>
where
    TurnstileApi: TurnstileApiService,
{
    async fn check(&self, response: Option<&str>) -> Result<(), CaptchaCheckError> {
        let CaptchaServiceConfig::Turnstile(config) = &self.config else {
            return Ok(());
        };

        let response = response.ok_or(CaptchaCheckError::Missing)?;

        let result = tokio::time::timeout(
            config.timeout,
            self.turnstile_api.siteverify(response, &config.secret),
        )
        .await
        .map_err(|_| {
            warn!(timeout = ?config.timeout, "turnstile siteverify timed out");
            CaptchaCheckError::Timeout
        })??;

        result.success.then_some(()).ok_or(CaptchaCheckError::Failed)
    }
}
