//! One-shot flash notifications.
//!
//! The attendance server leaves a short message in a `flash` cookie
//! after administrative actions. On launch the client shows that
//! message once and clears the cookie, whatever its content.

mod cookie;

pub use cookie::{CookieJar, FlashError};

use std::io::Write;

/// Name of the cookie carrying the flash message.
pub const FLASH_COOKIE: &str = "flash";

/// Blocking, user-facing alert.
pub trait Notifier {
    fn alert(&mut self, message: &str);
}

/// Prints alerts as a framed banner.
pub struct TerminalNotifier<W: Write> {
    out: W,
}

impl<W: Write> TerminalNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for TerminalNotifier<W> {
    fn alert(&mut self, message: &str) {
        let rule = "=".repeat(message.chars().count().clamp(8, 72));
        if let Err(e) = writeln!(self.out, "{rule}\n{message}\n{rule}").and_then(|_| self.out.flush())
        {
            tracing::warn!(error = %e, "Failed to display flash message");
        }
    }
}

/// Shows the pending flash message, if any, then clears the cookie.
///
/// Returns the decoded message that was shown. The cookie is removed
/// even when its value is empty or not valid percent-encoding.
pub fn take_flash(jar: &mut CookieJar, notifier: &mut impl Notifier) -> Option<String> {
    let raw = jar.remove(FLASH_COOKIE)?;
    if raw.is_empty() {
        return None;
    }

    let message = match urlencoding::decode(&raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::debug!(error = %e, "Flash cookie is not percent-encoded UTF-8");
            raw
        }
    };

    tracing::info!(message = %message, "Showing flash message");
    notifier.alert(&message);
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl Notifier for Recorder {
        fn alert(&mut self, message: &str) {
            self.0.push(message.to_string());
        }
    }

    #[test]
    fn test_flash_shown_once_and_cleared() {
        let mut jar = CookieJar::parse("flash=Welcome%20back");
        let mut recorder = Recorder::default();

        assert_eq!(take_flash(&mut jar, &mut recorder), Some("Welcome back".into()));
        assert_eq!(recorder.0, vec!["Welcome back".to_string()]);
        assert_eq!(jar.get(FLASH_COOKIE), None);

        // Second read on the same jar shows nothing.
        assert_eq!(take_flash(&mut jar, &mut recorder), None);
        assert_eq!(recorder.0.len(), 1);
    }

    #[test]
    fn test_no_flash_cookie() {
        let mut jar = CookieJar::parse("session=abc");
        let mut recorder = Recorder::default();
        assert_eq!(take_flash(&mut jar, &mut recorder), None);
        assert!(recorder.0.is_empty());
        assert_eq!(jar.get("session"), Some("abc"));
    }

    #[test]
    fn test_empty_flash_cleared_silently() {
        let mut jar = CookieJar::parse("flash=");
        let mut recorder = Recorder::default();
        assert_eq!(take_flash(&mut jar, &mut recorder), None);
        assert!(recorder.0.is_empty());
        assert!(jar.is_empty());
    }

    #[test]
    fn test_invalid_encoding_shown_raw() {
        let mut jar = CookieJar::parse("flash=bad%FFbyte");
        let mut recorder = Recorder::default();
        assert_eq!(take_flash(&mut jar, &mut recorder), Some("bad%FFbyte".into()));
        assert!(jar.is_empty());
    }

    #[test]
    fn test_terminal_banner() {
        let mut notifier = TerminalNotifier::new(Vec::new());
        notifier.alert("Attendance records deleted");
        let out = String::from_utf8(notifier.into_inner()).unwrap();
        assert!(out.contains("\nAttendance records deleted\n"));
        assert!(out.starts_with("==="));
    }
}
