//! HTTP client for the attendance-marking endpoint.

use super::AttendanceOutcome;
use crate::config::ServerConfig;
use crate::flash::CookieJar;
use crate::pipeline::RegistrationId;
use reqwest::header::SET_COOKIE;
use reqwest::Client;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while building the client. Submissions never fail.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Capability to submit a registration identifier for marking.
///
/// Implementations always resolve to an outcome; transport problems are
/// reported as [`AttendanceOutcome::NetworkFailure`], never as an error.
pub trait AttendanceApi: Send + Sync {
    /// Performs exactly one submission attempt for `id`.
    fn submit(&self, id: &RegistrationId) -> impl Future<Output = AttendanceOutcome> + Send;
}

/// Attendance client backed by `reqwest`.
#[derive(Clone)]
pub struct HttpAttendanceClient {
    http: Client,
    mark_url: String,
    cookies: Option<Arc<Mutex<CookieJar>>>,
}

impl HttpAttendanceClient {
    /// Creates a client for the configured server.
    ///
    /// No retries are ever issued: a repeated POST could mark the same
    /// student twice if the first one reached the server.
    pub fn new(config: &ServerConfig) -> Result<Self, ClientError> {
        let mark_url = config.mark_url();
        reqwest::Url::parse(&mark_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            // A redirect would turn the POST into a GET.
            .redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            mark_url,
            cookies: None,
        })
    }

    /// Captures `Set-Cookie` headers from responses into `jar`.
    pub fn with_cookie_jar(mut self, jar: Arc<Mutex<CookieJar>>) -> Self {
        self.cookies = Some(jar);
        self
    }

    /// Returns the full endpoint URL.
    pub fn mark_url(&self) -> &str {
        &self.mark_url
    }

    fn absorb_cookies(&self, headers: &reqwest::header::HeaderMap) {
        let Some(jar) = &self.cookies else {
            return;
        };
        let Ok(mut jar) = jar.lock() else {
            warn!("Cookie jar poisoned; ignoring Set-Cookie");
            return;
        };
        for value in headers.get_all(SET_COOKIE) {
            if let Ok(value) = value.to_str() {
                jar.apply_set_cookie(value);
            }
        }
    }
}

impl AttendanceApi for HttpAttendanceClient {
    async fn submit(&self, id: &RegistrationId) -> AttendanceOutcome {
        debug!(reg_no = %id, url = %self.mark_url, "Submitting attendance");

        let response = match self
            .http
            .post(&self.mark_url)
            .form(&[("reg_no", id.as_str())])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(reg_no = %id, error = %e, "Attendance request failed");
                return AttendanceOutcome::NetworkFailure;
            }
        };

        let status = response.status();
        self.absorb_cookies(response.headers());

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(reg_no = %id, error = %e, "Failed to read attendance response");
                return AttendanceOutcome::NetworkFailure;
            }
        };

        let outcome = AttendanceOutcome::from_body(&body);
        info!(
            reg_no = %id,
            http_status = status.as_u16(),
            outcome = outcome.label(),
            "Attendance submission finished"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_url_joins_base_and_path() {
        let config = ServerConfig {
            base_url: "http://127.0.0.1:8000/".into(),
            ..Default::default()
        };
        let client = HttpAttendanceClient::new(&config).unwrap();
        assert_eq!(client.mark_url(), "http://127.0.0.1:8000/attendance/mark");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = ServerConfig {
            base_url: "not a url".into(),
            ..Default::default()
        };
        assert!(matches!(
            HttpAttendanceClient::new(&config),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_failure() {
        // Port 9 (discard) on loopback is closed on test hosts.
        let config = ServerConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        };
        let client = HttpAttendanceClient::new(&config).unwrap();
        let id = RegistrationId::new("A100").unwrap();
        assert_eq!(client.submit(&id).await, AttendanceOutcome::NetworkFailure);
    }
}
