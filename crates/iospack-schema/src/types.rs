//! Newtype wrappers for the identifiers exchanged with the artifact service.
//!
//! Both newtypes serialize/deserialize as their plain inner value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Identifier of a package configuration previously prepared on the remote
/// build service. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u64")]
pub struct RequestId(u64);

impl RequestId {
    /// Accept a raw caller-supplied identifier. Absent, zero and negative
    /// values are rejected.
    pub fn from_raw(raw: Option<i64>) -> Option<Self> {
        match raw {
            Some(id) if id > 0 => Some(Self(id as u64)),
            _ => None,
        }
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<i64> for RequestId {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_raw(Some(value)).ok_or_else(|| format!("request id must be positive, got {value}"))
    }
}

impl From<RequestId> for u64 {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to a generated package archive, usually a download URL.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchiveRef(String);

impl ArchiveRef {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for ArchiveRef {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchiveRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArchiveRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ArchiveRef {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ArchiveRef {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<String> for ArchiveRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ArchiveRef {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_rejects_non_positive() {
        assert!(RequestId::from_raw(None).is_none());
        assert!(RequestId::from_raw(Some(0)).is_none());
        assert!(RequestId::from_raw(Some(-7)).is_none());
        assert_eq!(RequestId::from_raw(Some(42)).map(RequestId::get), Some(42));
    }

    #[test]
    fn request_id_serde_rejects_zero() {
        assert!(serde_json::from_str::<RequestId>("0").is_err());
        let id: RequestId = serde_json::from_str("9").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "9");
    }

    #[test]
    fn archive_ref_display_and_eq() {
        let archive = ArchiveRef::new("https://x/pkg.zip");
        assert_eq!(archive.to_string(), "https://x/pkg.zip");
        assert_eq!(archive, "https://x/pkg.zip");
        assert_eq!(archive.into_inner(), "https://x/pkg.zip");
    }

    #[test]
    fn archive_ref_serializes_as_plain_string() {
        let archive = ArchiveRef::from("a.zip");
        assert_eq!(serde_json::to_string(&archive).unwrap(), "\"a.zip\"");
    }
}
