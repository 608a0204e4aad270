//! Payload formats.
//!
//! The connection does not encode or decode payloads itself. It only stores
//! the format so the layer that maps resources to requests can pick the
//! right encoder, and uses its mime type as the default `Content-Type` of
//! requests that carry a body.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Wire format of resource payloads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// JSON payloads.
    #[default]
    Json,
    /// XML payloads.
    Xml,
}

impl Format {
    /// The mime type used in `Content-Type` / `Accept` headers.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }

    /// The file extension resource paths end with (e.g. `people.json`).
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "application/json" => Ok(Self::Json),
            "xml" | "application/xml" => Ok(Self::Xml),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}
