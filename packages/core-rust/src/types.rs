use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier selecting which country's rules and data apply.
///
/// No structure is assumed and nothing is validated: `"EG"`, `"eg"` and
/// `"egypt"` are three distinct codes. Normalization, if any, belongs to
/// whoever produces the code (e.g. a request resolver).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    /// Wraps any string as a country code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Borrows the raw code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the code, returning the underlying string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CountryCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for CountryCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl Borrow<str> for CountryCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CountryCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CountryCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Human-readable country name as provided by a [`CountryNames`](crate::CountryNames) table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryName(String);

impl CountryName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CountryName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for CountryName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl PartialEq<&str> for CountryName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
