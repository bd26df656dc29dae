use std::{
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
};

use anyhow::Context;
use config::{Environment, File, FileFormat};
pub use duration::Duration;
use folio_models::email_address::EmailAddressWithName;
use serde::Deserialize;
use url::Url;

mod duration;

pub const DEFAULT_CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../config.toml");

/// Environment variable holding a colon separated list of additional config
/// files, applied in order on top of the defaults.
pub const CONFIG_PATHS_VAR: &str = "FOLIO_CONFIG";

/// Prefix of environment variables overriding single config values, e.g.
/// `FOLIO_EMAIL__PASSWORD` for `email.password`.
pub const ENV_PREFIX: &str = "FOLIO";

/// Load the default config, the files listed in `FOLIO_CONFIG` and the
/// `FOLIO_*` environment overrides.
pub fn load() -> anyhow::Result<Config> {
    let extra_paths = std::env::var_os(CONFIG_PATHS_VAR)
        .map(|paths| std::env::split_paths(&paths).collect::<Vec<_>>())
        .unwrap_or_default();

    let paths = std::iter::once(PathBuf::from(DEFAULT_CONFIG_PATH))
        .chain(extra_paths)
        .collect::<Vec<_>>();

    build(&paths, &[], true)
}

/// Load the given config files followed by `overrides`, which are toml
/// snippets like `turnstile.enable = true`. Environment variables are ignored.
pub fn load_with_override(paths: &[impl AsRef<Path>], overrides: &[&str]) -> anyhow::Result<Config> {
    build(paths, overrides, false)
}

fn build(
    paths: &[impl AsRef<Path>],
    overrides: &[&str],
    environment: bool,
) -> anyhow::Result<Config> {
    let builder = paths
        .iter()
        .try_fold(config::Config::builder(), |builder, path| {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file at {}", path.display()))?;
            let source = File::from_str(&content, FileFormat::Toml);
            anyhow::Ok(builder.add_source(source))
        })?;

    let builder = overrides.iter().fold(builder, |builder, snippet| {
        builder.add_source(File::from_str(snippet, FileFormat::Toml))
    });

    let builder = if environment {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    } else {
        builder
    };

    builder
        .build()?
        .try_deserialize()
        .context("Failed to load config")
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub http: HttpConfig,
    pub email: EmailConfig,
    pub contact: ContactConfig,
    pub turnstile: TurnstileConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub address: SocketAddr,
    pub body_timeout: Duration,
    pub body_limit: usize,
    pub real_ip: Option<HttpRealIpConfig>,
}

#[derive(Debug, Deserialize)]
pub struct HttpRealIpConfig {
    pub header: String,
    pub set_from: IpAddr,
}

#[derive(Deserialize)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub security: SmtpSecurity,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: EmailAddressWithName,
    pub connect_timeout: Duration,
    pub send_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Implicit tls, usually on port 465
    Tls,
    /// Plaintext connection upgraded via STARTTLS, usually on port 587
    Starttls,
    /// No encryption at all, only suitable for local testing
    None,
}

#[derive(Debug, Deserialize)]
pub struct ContactConfig {
    pub recipient: EmailAddressWithName,
    pub redirect_url: String,
    pub send_retries: u32,
    pub retry_delay: Duration,
}

#[derive(Deserialize)]
pub struct TurnstileConfig {
    pub enable: bool,
    pub secret: Option<String>,
    pub siteverify_endpoint_override: Option<Url>,
    pub timeout: Duration,
}

const REDACTED: &str = "[redacted]";

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("from", &self.from)
            .field("connect_timeout", &self.connect_timeout)
            .field("send_timeout", &self.send_timeout)
            .finish()
    }
}

impl std::fmt::Debug for TurnstileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnstileConfig")
            .field("enable", &self.enable)
            .field("secret", &self.secret.as_ref().map(|_| REDACTED))
            .field(
                "siteverify_endpoint_override",
                &self.siteverify_endpoint_override,
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_default_config() {
        let config = load_with_override(&[DEFAULT_CONFIG_PATH], &[]).unwrap();
        assert!(!config.turnstile.enable);
        assert_eq!(config.email.security, SmtpSecurity::None);
        assert_eq!(
            config.contact.redirect_url,
            "/submitted/contact_form_submitted.html"
        );
        assert_eq!(*config.http.body_timeout, std::time::Duration::from_secs(5));
    }

    #[test]
    fn overrides() {
        let config = load_with_override(
            &[DEFAULT_CONFIG_PATH],
            &[
                "turnstile.enable = true",
                "turnstile.secret = \"s3cr3t\"",
                "email.security = \"starttls\"",
                "email.port = 587",
            ],
        )
        .unwrap();
        assert!(config.turnstile.enable);
        assert_eq!(config.turnstile.secret.as_deref(), Some("s3cr3t"));
        assert_eq!(config.email.security, SmtpSecurity::Starttls);
        assert_eq!(config.email.port, 587);
    }

    #[test]
    fn invalid_security_mode() {
        let result = load_with_override(&[DEFAULT_CONFIG_PATH], &["email.security = \"ssl\""]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_file() {
        let result = load_with_override(&["/nonexistent/folio.toml"], &[]);
        assert!(result.is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = load_with_override(
            &[DEFAULT_CONFIG_PATH],
            &[
                "email.username = \"contact\"",
                "email.password = \"hunter2\"",
                "turnstile.secret = \"s3cr3t\"",
            ],
        )
        .unwrap();

        let output = format!("{config:#?}");

        assert!(output.contains("\"contact\""));
        assert!(output.contains("[redacted]"));
        assert!(!output.contains("hunter2"));
        assert!(!output.contains("s3cr3t"));
    }
}
