use std::ops::Deref;

use serde::Deserialize;
use thiserror::Error;

/// A duration written as whitespace separated parts like `"1d 2h 3m 4s"`.
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
    type Err = InvalidDuration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace()
            .try_fold(std::time::Duration::ZERO, |total, part| {
                parse_part(part).map(|part| total + part)
            })
            .map(Self)
            .ok_or(InvalidDuration)
    }
}

fn parse_part(part: &str) -> Option<std::time::Duration> {
    let unit_start = part.find(|c: char| !c.is_ascii_digit())?;
    let (value, unit) = part.split_at(unit_start);
    let value = value.parse::<u64>().ok()?;
    let factor = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };
    value
        .checked_mul(factor)
        .map(std::time::Duration::from_secs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid duration")]
pub struct InvalidDuration;

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
