//! Registration identifier extraction from decoded QR payloads.

use std::fmt;

/// Prefix the attendance server embeds in every generated QR code.
pub const REG_PREFIX: &str = "REG:";

/// A normalized, non-empty registration identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistrationId(String);

impl RegistrationId {
    /// Wraps an already-normalized identifier.
    ///
    /// Returns `None` for empty or whitespace-only input; surrounding
    /// whitespace is trimmed.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RegistrationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Maps a decoded payload to a registration identifier.
///
/// Strips exactly one leading `REG:` prefix when present, then trims
/// surrounding whitespace. Absent, empty and whitespace-only payloads
/// yield `None`.
pub fn extract(decoded: Option<&str>) -> Option<RegistrationId> {
    let decoded = decoded?;
    let body = decoded.strip_prefix(REG_PREFIX).unwrap_or(decoded);
    RegistrationId::new(body)
}
