use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use folio_core_contact_contracts::{ContactSubmitError, MockContactService};
use folio_models::contact::ContactSubmission;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;

const FORM: &str = "full-name=Ada+Lovelace&company-name=Analytical+Engines+Ltd\
                    &email=ada%40example.com&message=Hello+World%21";

fn config() -> RestServerConfig {
    RestServerConfig {
        addr: "127.0.0.1:0".parse().unwrap(),
        real_ip_config: None,
        body_timeout: Duration::from_secs(5),
        body_limit: 1024,
        redirect_url: "/submitted/contact_form_submitted.html".into(),
    }
}

fn submission() -> ContactSubmission {
    ContactSubmission {
        full_name: "Ada Lovelace".try_into().unwrap(),
        company_name: "Analytical Engines Ltd".try_into().unwrap(),
        email: "ada@example.com".try_into().unwrap(),
        message: "Hello World!".try_into().unwrap(),
    }
}

async fn call(contact: MockContactService, request: Request<Body>) -> Response {
    call_with_config(contact, config(), request).await
}

async fn call_with_config(
    contact: MockContactService,
    config: RestServerConfig,
    request: Request<Body>,
) -> Response {
    RestServer::new(config, contact)
        .router()
        .oneshot(request)
        .await
        .unwrap()
}

fn post(content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap()
}

fn post_form(body: impl Into<Body>) -> Request<Body> {
    post("application/x-www-form-urlencoded", body)
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn assert_redirect(response: &Response) {
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/submitted/contact_form_submitted.html"
    );
}

#[tokio::test]
async fn submit_urlencoded() {
    // Arrange
    let contact = MockContactService::new().with_submit(submission(), None, Ok(()));

    // Act
    let response = call(contact, post_form(FORM)).await;

    // Assert
    assert_redirect(&response);
    assert!(response.headers().contains_key("X-Request-Id"));
}

#[tokio::test]
async fn submit_json() {
    // Arrange
    let contact =
        MockContactService::new().with_submit(submission(), Some("token".into()), Ok(()));
    let body = json!({
        "full-name": "Ada Lovelace",
        "company-name": "Analytical Engines Ltd",
        "email": "ada@example.com",
        "message": "Hello World!",
        "cf-turnstile-response": "token",
    });

    // Act
    let response = call(contact, post("application/json", body.to_string())).await;

    // Assert
    assert_redirect(&response);
}

#[tokio::test]
async fn submit_multipart() {
    // Arrange
    let contact =
        MockContactService::new().with_submit(submission(), Some("token".into()), Ok(()));
    let body = [
        ("full-name", "Ada Lovelace"),
        ("company-name", "Analytical Engines Ltd"),
        ("email", "ada@example.com"),
        ("message", "Hello World!"),
        ("cf-turnstile-response", "token"),
        ("unrelated", "ignored"),
    ]
    .into_iter()
    .map(|(name, value)| {
        format!("--XYZ\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
    })
    .chain(["--XYZ--\r\n".to_owned()])
    .collect::<String>();

    // Act
    let response = call(contact, post("multipart/form-data; boundary=XYZ", body)).await;

    // Assert
    assert_redirect(&response);
}

#[tokio::test]
async fn blank_captcha_response_is_absent() {
    // Arrange
    let contact = MockContactService::new().with_submit(submission(), None, Ok(()));

    // Act
    let response = call(
        contact,
        post_form(format!("{FORM}&cf-turnstile-response=+++")),
    )
    .await;

    // Assert
    assert_redirect(&response);
}

#[tokio::test]
async fn method_not_allowed() {
    // Arrange
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/contact")
        .body(Body::empty())
        .unwrap();

    // Act
    let response = call(MockContactService::new(), request).await;

    // Assert
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(response).await, json!({"error": "Method not allowed"}));
}

#[tokio::test]
async fn not_found() {
    // Arrange
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/unknown")
        .body(Body::empty())
        .unwrap();

    // Act
    let response = call(MockContactService::new(), request).await;

    // Assert
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await, json!({"error": "Not found"}));
}

#[tokio::test]
async fn unsupported_content_type() {
    // Act
    let response = call(MockContactService::new(), post("text/plain", FORM)).await;

    // Assert
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        json_body(response).await,
        json!({"error": "Unsupported content type"})
    );
}

#[tokio::test]
async fn missing_content_type() {
    // Arrange
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/contact")
        .body(Body::from(FORM))
        .unwrap();

    // Act
    let response = call(MockContactService::new(), request).await;

    // Assert
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn malformed_json() {
    // Act
    let response = call(
        MockContactService::new(),
        post("application/json", "{\"full-name\": "),
    )
    .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"error": "Malformed body"}));
}

#[tokio::test]
async fn payload_too_large() {
    // Arrange
    let body = format!("{FORM}&padding={}", "x".repeat(2048));

    // Act
    let response = call(MockContactService::new(), post_form(body)).await;

    // Assert
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json_body(response).await, json!({"error": "Payload too large"}));
}

#[tokio::test]
async fn body_timeout() {
    // Arrange
    let config = RestServerConfig {
        body_timeout: Duration::from_millis(50),
        ..config()
    };
    let body = Body::from_stream(futures::stream::pending::<Result<Vec<u8>, std::io::Error>>());

    // Act
    let response = call_with_config(MockContactService::new(), config, post_form(body)).await;

    // Assert
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json_body(response).await, json!({"error": "Request timeout"}));
}

#[tokio::test]
async fn missing_fields() {
    // Act
    let response = call(
        MockContactService::new(),
        post_form("full-name=Ada&message=+"),
    )
    .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({
            "error": "Missing required fields",
            "fields": ["company-name", "email", "message"],
        })
    );
}

#[tokio::test]
async fn invalid_email() {
    // Act
    let response = call(
        MockContactService::new(),
        post_form("full-name=Ada&company-name=ACME&email=ada%40example&message=Hi"),
    )
    .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"error": "Invalid email", "fields": ["email"]})
    );
}

#[tokio::test]
async fn invalid_fields() {
    // Arrange
    let body = json!({
        "full-name": "x".repeat(300),
        "company-name": "ACME",
        "email": "ada@example.com",
        "message": "Hi",
    });

    // Act
    let response = call(
        MockContactService::new(),
        post("application/json", body.to_string()),
    )
    .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"error": "Invalid fields", "fields": ["full-name"]})
    );
}

#[tokio::test]
async fn submit_errors() {
    for (err, status, expected) in [
        (
            ContactSubmitError::CaptchaMissing,
            StatusCode::BAD_REQUEST,
            json!({"error": "Missing required fields", "fields": ["cf-turnstile-response"]}),
        ),
        (
            ContactSubmitError::CaptchaFailed,
            StatusCode::FORBIDDEN,
            json!({"error": "Captcha failed"}),
        ),
        (
            ContactSubmitError::CaptchaTimeout,
            StatusCode::GATEWAY_TIMEOUT,
            json!({"error": "Verification unavailable"}),
        ),
        (
            ContactSubmitError::CaptchaUnavailable(anyhow::anyhow!("connection refused")),
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "Verification unavailable"}),
        ),
        (
            ContactSubmitError::SendTimeout,
            StatusCode::GATEWAY_TIMEOUT,
            json!({"error": "Failed to send"}),
        ),
        (
            ContactSubmitError::Send,
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "Failed to send"}),
        ),
        (
            ContactSubmitError::Other(anyhow::anyhow!("some error")),
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "Internal server error"}),
        ),
    ] {
        // Arrange
        let contact = MockContactService::new().with_submit(submission(), None, Err(err));

        // Act
        let response = call(contact, post_form(FORM)).await;

        // Assert
        assert_eq!(response.status(), status);
        assert_eq!(json_body(response).await, expected);
    }
}

#[tokio::test]
async fn handler_panic() {
    // Arrange
    let mut contact = MockContactService::new();
    contact
        .expect_submit()
        .once()
        .returning(|_, _| panic!("mailer exploded"));

    // Act
    let response = call(contact, post_form(FORM)).await;

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"error": "Internal server error"})
    );
}
