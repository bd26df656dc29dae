use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use folio_models::contact::{
    ContactCompanyName, ContactEmail, ContactFullName, ContactMessageContent, ContactSubmission,
};
use tracing::debug;

use crate::{
    errors::{error, field_error},
    models::contact::{
        ApiContactSubmission, CAPTCHA_RESPONSE, COMPANY_NAME, EMAIL, FULL_NAME, MESSAGE,
    },
};

/// Upper bound for reading and parsing the request body.
#[derive(Debug, Clone, Copy)]
pub struct BodyTimeout(pub Duration);

/// A validated contact form submission, read from an urlencoded, multipart or
/// json body.
#[derive(Debug)]
pub struct SubmissionForm {
    pub submission: ContactSubmission,
    /// Blank tokens are treated as absent.
    pub captcha_response: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubmissionRejection {
    UnsupportedContentType,
    PayloadTooLarge,
    Timeout,
    Malformed,
    Fields(Vec<FieldError>),
    CaptchaResponseMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl FieldError {
    fn field(self) -> &'static str {
        match self {
            Self::Missing(field) | Self::Invalid(field) => field,
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for SubmissionForm
where
    S: Send + Sync,
    BodyTimeout: FromRef<S>,
{
    type Rejection = SubmissionRejection;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let BodyTimeout(timeout) = BodyTimeout::from_ref(state);

        let raw = tokio::time::timeout(timeout, read_body(request))
            .await
            .map_err(|_| {
                debug!(?timeout, "timed out while reading request body");
                SubmissionRejection::Timeout
            })??;

        let captcha_response = raw
            .captcha_response
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(ToOwned::to_owned);

        Ok(Self {
            submission: validate(raw)?,
            captcha_response,
        })
    }
}

impl IntoResponse for SubmissionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::UnsupportedContentType => error(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported content type",
            ),
            Self::PayloadTooLarge => error(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large"),
            Self::Timeout => error(StatusCode::GATEWAY_TIMEOUT, "Request timeout"),
            Self::Malformed => error(StatusCode::BAD_REQUEST, "Malformed body"),
            Self::Fields(errors) => {
                let message = if errors.contains(&FieldError::Invalid(EMAIL)) {
                    "Invalid email"
                } else if errors.iter().any(|e| matches!(e, FieldError::Missing(_))) {
                    "Missing required fields"
                } else {
                    "Invalid fields"
                };
                let fields = errors.into_iter().map(FieldError::field).collect();
                field_error(StatusCode::BAD_REQUEST, message, fields)
            }
            Self::CaptchaResponseMissing => field_error(
                StatusCode::BAD_REQUEST,
                "Missing required fields",
                vec![CAPTCHA_RESPONSE],
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    UrlEncoded,
    Multipart,
    Json,
}

impl BodyFormat {
    fn from_request(request: &Request) -> Option<Self> {
        let content_type = request.headers().get(CONTENT_TYPE)?.to_str().ok()?;
        let essence = content_type.split(';').next()?.trim();

        if essence.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Some(Self::UrlEncoded)
        } else if essence.eq_ignore_ascii_case("multipart/form-data") {
            Some(Self::Multipart)
        } else if essence.eq_ignore_ascii_case("application/json") {
            Some(Self::Json)
        } else {
            None
        }
    }
}

async fn read_body(request: Request) -> Result<ApiContactSubmission, SubmissionRejection> {
    let format =
        BodyFormat::from_request(&request).ok_or(SubmissionRejection::UnsupportedContentType)?;

    match format {
        BodyFormat::UrlEncoded => Form::<ApiContactSubmission>::from_request(request, &())
            .await
            .map(|Form(raw)| raw)
            .map_err(|err| body_rejection(err.status(), &err.body_text())),
        BodyFormat::Json => Json::<ApiContactSubmission>::from_request(request, &())
            .await
            .map(|Json(raw)| raw)
            .map_err(|err| body_rejection(err.status(), &err.body_text())),
        BodyFormat::Multipart => {
            let mut multipart = Multipart::from_request(request, &())
                .await
                .map_err(|err| body_rejection(err.status(), &err.body_text()))?;

            let mut raw = ApiContactSubmission::default();
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|err| body_rejection(err.status(), &err.body_text()))?
            {
                let Some(name) = field.name().map(ToOwned::to_owned) else {
                    continue;
                };
                let value = field
                    .text()
                    .await
                    .map_err(|err| body_rejection(err.status(), &err.body_text()))?;
                raw.set(&name, value);
            }

            Ok(raw)
        }
    }
}

fn body_rejection(status: StatusCode, text: &str) -> SubmissionRejection {
    debug!(%status, "failed to read request body: {text}");
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        SubmissionRejection::PayloadTooLarge
    } else {
        SubmissionRejection::Malformed
    }
}

fn validate(raw: ApiContactSubmission) -> Result<ContactSubmission, SubmissionRejection> {
    let mut errors = Vec::new();

    let full_name = check(FULL_NAME, raw.full_name, &mut errors, |value| {
        ContactFullName::try_new(value).ok()
    });
    let company_name = check(COMPANY_NAME, raw.company_name, &mut errors, |value| {
        ContactCompanyName::try_new(value).ok()
    });
    let email = check(EMAIL, raw.email, &mut errors, |value| {
        ContactEmail::try_new(value).ok()
    });
    let message = check(MESSAGE, raw.message, &mut errors, |value| {
        ContactMessageContent::try_new(value).ok()
    });

    match (full_name, company_name, email, message) {
        (Some(full_name), Some(company_name), Some(email), Some(message)) => {
            Ok(ContactSubmission {
                full_name,
                company_name,
                email,
                message,
            })
        }
        _ => Err(SubmissionRejection::Fields(errors)),
    }
}

fn check<T>(
    field: &'static str,
    value: Option<String>,
    errors: &mut Vec<FieldError>,
    parse: impl FnOnce(String) -> Option<T>,
) -> Option<T> {
    let Some(value) = value.filter(|value| !value.trim().is_empty()) else {
        errors.push(FieldError::Missing(field));
        return None;
    };

    let parsed = parse(value);
    if parsed.is_none() {
        errors.push(FieldError::Invalid(field));
    }
    parsed
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn raw() -> ApiContactSubmission {
        ApiContactSubmission {
            full_name: Some("Ada Lovelace".into()),
            company_name: Some("Analytical Engines Ltd".into()),
            email: Some("ada@example.com".into()),
            message: Some("Hello World!".into()),
            captcha_response: None,
        }
    }

    #[test]
    fn valid() {
        let submission = validate(raw()).unwrap();
        assert_eq!(*submission.full_name, "Ada Lovelace");
        assert_eq!(*submission.email, "ada@example.com");
    }

    #[test]
    fn all_missing() {
        let result = validate(ApiContactSubmission::default());
        assert_eq!(
            result.unwrap_err(),
            SubmissionRejection::Fields(vec![
                FieldError::Missing(FULL_NAME),
                FieldError::Missing(COMPANY_NAME),
                FieldError::Missing(EMAIL),
                FieldError::Missing(MESSAGE),
            ])
        );
    }

    #[test]
    fn blank_is_missing() {
        let result = validate(ApiContactSubmission {
            company_name: Some("   ".into()),
            ..raw()
        });
        assert_eq!(
            result.unwrap_err(),
            SubmissionRejection::Fields(vec![FieldError::Missing(COMPANY_NAME)])
        );
    }

    #[test]
    fn invalid_email_with_missing_field() {
        let result = validate(ApiContactSubmission {
            full_name: None,
            email: Some("ada@example".into()),
            ..raw()
        });
        assert_eq!(
            result.unwrap_err(),
            SubmissionRejection::Fields(vec![
                FieldError::Missing(FULL_NAME),
                FieldError::Invalid(EMAIL),
            ])
        );
    }

    #[test]
    fn message_too_long() {
        let result = validate(ApiContactSubmission {
            message: Some("x".repeat(4097)),
            ..raw()
        });
        assert_eq!(
            result.unwrap_err(),
            SubmissionRejection::Fields(vec![FieldError::Invalid(MESSAGE)])
        );
    }

    #[test]
    fn body_format() {
        for (content_type, expected) in [
            ("application/x-www-form-urlencoded", Some(BodyFormat::UrlEncoded)),
            (
                "application/x-www-form-urlencoded; charset=UTF-8",
                Some(BodyFormat::UrlEncoded),
            ),
            ("multipart/form-data; boundary=xyz", Some(BodyFormat::Multipart)),
            ("Application/JSON", Some(BodyFormat::Json)),
            ("text/plain", None),
        ] {
            let request = Request::builder()
                .header(CONTENT_TYPE, content_type)
                .body(axum::body::Body::empty())
                .unwrap();
            assert_eq!(BodyFormat::from_request(&request), expected, "{content_type}");
        }

        let request = Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(BodyFormat::from_request(&request), None);
    }
}
