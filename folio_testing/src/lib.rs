//! Fake versions of the external services the contact relay talks to, for
//! integration tests and local development.

pub mod smtp;
pub mod turnstile;
