use std::ops::Deref;

use serde::Deserialize;

/// A duration written as whitespace separated `<number><unit>` parts, where
/// unit is one of `ms`, `s`, `m`, `h` or `d` (e.g. `1m 30s`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration(pub std::time::Duration);

impl From<Duration> for std::time::Duration {
    fn from(value: Duration) -> Self {
        value.0
    }
}

impl Deref for Duration {
    type Target = std::time::Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::str::FromStr for Duration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace()
            .try_fold(std::time::Duration::ZERO, |out, part| {
                let digits = part.bytes().take_while(u8::is_ascii_digit).count();
                let value = part[..digits]
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid duration {part:?}"))?;
                let secs = |factor: u64| {
                    value
                        .checked_mul(factor)
                        .map(std::time::Duration::from_secs)
                        .ok_or_else(|| format!("Invalid duration {part:?}"))
                };
                let part = match &part[digits..] {
                    "ms" => std::time::Duration::from_millis(value),
                    "s" => secs(1)?,
                    "m" => secs(60)?,
                    "h" => secs(3600)?,
                    "d" => secs(24 * 3600)?,
                    unit => return Err(format!("Invalid duration unit {unit:?}")),
                };
                out.checked_add(part)
                    .ok_or_else(|| "Invalid duration".to_owned())
            })
            .map(Self)
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}
