use serde::Deserialize;

pub const FULL_NAME: &str = "full-name";
pub const COMPANY_NAME: &str = "company-name";
pub const EMAIL: &str = "email";
pub const MESSAGE: &str = "message";
pub const CAPTCHA_RESPONSE: &str = "cf-turnstile-response";

/// Contact form fields as sent by the browser, before any validation.
#[derive(Debug, Default, Deserialize)]
pub struct ApiContactSubmission {
    #[serde(rename = "full-name")]
    pub full_name: Option<String>,
    #[serde(rename = "company-name")]
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "cf-turnstile-response")]
    pub captcha_response: Option<String>,
}

impl ApiContactSubmission {
    /// Store a multipart field. Unknown fields are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        let slot = match name {
            FULL_NAME => &mut self.full_name,
            COMPANY_NAME => &mut self.company_name,
            EMAIL => &mut self.email,
            MESSAGE => &mut self.message,
            CAPTCHA_RESPONSE => &mut self.captcha_response,
            _ => return,
        };
        *slot = Some(value);
    }
}
