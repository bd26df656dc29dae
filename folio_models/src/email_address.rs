use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A mailbox (optional display name and address), e.g. `Contact Form
/// <contact@example.com>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddressWithName(pub lettre::message::Mailbox);

impl EmailAddressWithName {
    pub fn new(name: Option<String>, address: &str) -> Option<Self> {
        let email = address.parse::<lettre::Address>().ok()?;
        Some(Self(lettre::message::Mailbox { name, email }))
    }

    pub fn address(&self) -> &str {
        self.0.email.as_ref()
    }
}

impl FromStr for EmailAddressWithName {
    type Err = <lettre::message::Mailbox as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl std::fmt::Display for EmailAddressWithName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_name() {
        let mailbox = "Contact Form <contact@example.com>"
            .parse::<EmailAddressWithName>()
            .unwrap();
        assert_eq!(mailbox.0.name.as_deref(), Some("Contact Form"));
        assert_eq!(mailbox.address(), "contact@example.com");
    }

    #[test]
    fn deserialize() {
        let mailbox = serde_json::from_value::<EmailAddressWithName>(
            "inbox@example.com".into(),
        )
        .unwrap();
        assert_eq!(mailbox.0.name, None);
        assert_eq!(mailbox.address(), "inbox@example.com");
    }

    #[test]
    fn new_rejects_invalid_address() {
        assert_eq!(EmailAddressWithName::new(None, "not an address"), None);
    }
}
