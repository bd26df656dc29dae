use std::{sync::Arc, time::Duration};

use axum::{
    extract::{FromRef, State},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    routing, Router,
};
use folio_core_contact_contracts::{ContactService, ContactSubmitError};
use tracing::warn;

use crate::{
    errors::{error, internal_server_error},
    extractors::submission::{BodyTimeout, SubmissionForm, SubmissionRejection},
};

pub const CONTACT_ROUTE: &str = "/api/contact";

pub fn router<S: ContactService>(
    service: Arc<S>,
    body_timeout: Duration,
    redirect_url: Arc<str>,
) -> Router<()> {
    Router::new()
        .route(
            CONTACT_ROUTE,
            routing::post(submit::<S>).fallback(method_not_allowed),
        )
        .with_state(ContactState {
            service,
            body_timeout,
            redirect_url,
        })
}

struct ContactState<S> {
    service: Arc<S>,
    body_timeout: Duration,
    redirect_url: Arc<str>,
}

impl<S> Clone for ContactState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            body_timeout: self.body_timeout,
            redirect_url: Arc::clone(&self.redirect_url),
        }
    }
}

impl<S> FromRef<ContactState<S>> for BodyTimeout {
    fn from_ref(input: &ContactState<S>) -> Self {
        Self(input.body_timeout)
    }
}

async fn submit<S: ContactService>(
    state: State<ContactState<S>>,
    SubmissionForm {
        submission,
        captcha_response,
    }: SubmissionForm,
) -> Response {
    match state.service.submit(submission, captcha_response).await {
        Ok(()) => (StatusCode::FOUND, [(LOCATION, &*state.redirect_url)]).into_response(),
        Err(ContactSubmitError::CaptchaMissing) => {
            SubmissionRejection::CaptchaResponseMissing.into_response()
        }
        Err(ContactSubmitError::CaptchaFailed) => error(StatusCode::FORBIDDEN, "Captcha failed"),
        Err(ContactSubmitError::CaptchaTimeout) => {
            error(StatusCode::GATEWAY_TIMEOUT, "Verification unavailable")
        }
        Err(ContactSubmitError::CaptchaUnavailable(err)) => {
            warn!("captcha verification failed: {err:#}");
            error(StatusCode::INTERNAL_SERVER_ERROR, "Verification unavailable")
        }
        Err(ContactSubmitError::SendTimeout) => {
            error(StatusCode::GATEWAY_TIMEOUT, "Failed to send")
        }
        Err(ContactSubmitError::Send) => {
            error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to send")
        }
        Err(ContactSubmitError::Other(err)) => internal_server_error(err),
    }
}

async fn method_not_allowed() -> Response {
    error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}
