use std::{ops::Deref, sync::LazyLock, time::Duration};

use folio_utils::folio_version;

pub static USER_AGENT: LazyLock<String> =
    LazyLock::new(|| format!("folio-contact-relay/{}", folio_version()));

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct HttpClient(reqwest::Client);

impl Deref for HttpClient {
    type Target = reqwest::Client;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl HttpClient {
    pub fn new() -> anyhow::Result<Self> {
        reqwest::Client::builder()
            .user_agent(&*USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map(Self)
            .map_err(Into::into)
    }
}
