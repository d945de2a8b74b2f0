//! Minimal session cookie jar.
//!
//! Holds name/value pairs only. Attributes other than a non-positive
//! `Max-Age` (which deletes the cookie) are ignored.

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while persisting the jar.
#[derive(Debug, Error)]
pub enum FlashError {
    #[error("failed to read cookie file: {0}")]
    Read(std::io::Error),
    #[error("failed to write cookie file: {0}")]
    Write(std::io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `Cookie:` header style string (`a=1; b=2`).
    ///
    /// Segments without `=` are skipped.
    pub fn parse(header: &str) -> Self {
        let cookies = header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                (!name.is_empty()).then(|| (name.to_string(), unquote(value.trim()).to_string()))
            })
            .collect();
        Self { cookies }
    }

    /// Loads the jar from `path`; a missing file is an empty jar.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FlashError> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(content) => Ok(Self::parse(content.trim())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(FlashError::Read(e)),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FlashError> {
        std::fs::write(path.as_ref(), self.to_header()).map_err(FlashError::Write)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.cookies.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Applies one `Set-Cookie` header value.
    pub fn apply_set_cookie(&mut self, header: &str) {
        let mut parts = header.split(';');
        let Some((name, value)) = parts.next().and_then(|p| p.split_once('=')) else {
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        let expired = parts.any(|attr| {
            let Some((key, val)) = attr.split_once('=') else {
                return false;
            };
            key.trim().eq_ignore_ascii_case("max-age")
                && val.trim().parse::<i64>().map_or(false, |age| age <= 0)
        });

        if expired {
            tracing::debug!(cookie = name, "Cookie expired by server");
            self.cookies.remove(name);
        } else {
            self.cookies
                .insert(name.to_string(), unquote(value.trim()).to_string());
        }
    }

    /// Serializes the jar as a `Cookie:` header string.
    pub fn to_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// Servers quote values containing spaces or commas.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let jar = CookieJar::parse("session=abc; flash=Welcome%20back;  junk ; =x");
        assert_eq!(jar.get("session"), Some("abc"));
        assert_eq!(jar.get("flash"), Some("Welcome%20back"));
        assert_eq!(jar.get("junk"), None);
    }

    #[test]
    fn test_set_cookie_adds_and_expires() {
        let mut jar = CookieJar::new();
        jar.apply_set_cookie("flash=\"Admin login successful\"; Max-Age=5; Path=/; SameSite=lax");
        assert_eq!(jar.get("flash"), Some("Admin login successful"));

        jar.apply_set_cookie("flash=; Max-Age=0; path=/");
        assert_eq!(jar.get("flash"), None);
        assert!(jar.is_empty());
    }

    #[test]
    fn test_header_round_trip_order() {
        let mut jar = CookieJar::new();
        jar.set("b", "2");
        jar.set("a", "1");
        assert_eq!(jar.to_header(), "a=1; b=2");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::load(dir.path().join("absent")).unwrap();
        assert!(jar.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies");
        let mut jar = CookieJar::new();
        jar.set("flash", "Upload%20complete");
        jar.save(&path).unwrap();

        assert_eq!(CookieJar::load(&path).unwrap(), jar);
    }
}
