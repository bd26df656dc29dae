use std::sync::LazyLock;

use nutype::nutype;
use regex::Regex;

use crate::email_address::EmailAddressWithName;

/// A validated contact form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub full_name: ContactFullName,
    pub company_name: ContactCompanyName,
    pub email: ContactEmail,
    pub message: ContactMessageContent,
}

impl ContactSubmission {
    /// The submitter's mailbox, if the address is also acceptable as an smtp
    /// address.
    pub fn author_mailbox(&self) -> Option<EmailAddressWithName> {
        EmailAddressWithName::new(Some((*self.full_name).clone()), &self.email)
    }
}

/// Matches `local@domain.tld`, nothing more.
pub static CONTACT_EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 256),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactFullName(String);

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 256),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactCompanyName(String);

#[nutype(
    sanitize(trim),
    validate(len_char_max = 256, regex = CONTACT_EMAIL_REGEX),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactEmail(String);

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 4096),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactMessageContent(String);
