//! `format` keyword checks.
//!
//! Only formats with an unambiguous definition are enforced. Anything else
//! (`password`, `binary`, vendor formats) is kept as an annotation.

use std::net::{Ipv4Addr, Ipv6Addr};

use serde_json::Number;

use crate::numeric::Decimal;

/// A recognised `format` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    /// RFC 3339 date-time.
    DateTime,
    /// RFC 3339 full-date.
    Date,
    /// Mailbox address.
    Email,
    /// RFC 4122 UUID.
    Uuid,
    /// Dotted-quad IPv4 address.
    Ipv4,
    /// IPv6 address.
    Ipv6,
    /// Absolute URI.
    Uri,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Not enforced.
    Other(String),
}

impl Format {
    /// Maps a `format` keyword value.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "date-time" => Self::DateTime,
            "date" => Self::Date,
            "email" => Self::Email,
            "uuid" => Self::Uuid,
            "ipv4" => Self::Ipv4,
            "ipv6" => Self::Ipv6,
            "uri" => Self::Uri,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the keyword spelling.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::DateTime => "date-time",
            Self::Date => "date",
            Self::Email => "email",
            Self::Uuid => "uuid",
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
            Self::Uri => "uri",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Other(name) => name,
        }
    }

    /// Checks a string instance. Numeric formats accept every string.
    #[must_use]
    pub fn check_str(&self, value: &str) -> bool {
        match self {
            Self::DateTime => chrono::DateTime::parse_from_rfc3339(value).is_ok(),
            Self::Date => chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
            Self::Email => is_email(value),
            Self::Uuid => uuid::Uuid::parse_str(value).is_ok(),
            Self::Ipv4 => value.parse::<Ipv4Addr>().is_ok(),
            Self::Ipv6 => value.parse::<Ipv6Addr>().is_ok(),
            Self::Uri => reqwest::Url::parse(value).is_ok(),
            Self::Int32 | Self::Int64 | Self::Other(_) => true,
        }
    }

    /// Checks a numeric instance. String formats accept every number.
    #[must_use]
    pub fn check_number(&self, value: &Number) -> bool {
        let (min, max) = match self {
            Self::Int32 => (i64::from(i32::MIN), i64::from(i32::MAX)),
            Self::Int64 => (i64::MIN, i64::MAX),
            _ => return true,
        };
        let Some(value) = Decimal::from_number(value) else {
            return false;
        };
        value.is_integer() && value >= Decimal::from(min) && value <= Decimal::from(max)
    }
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}
