//! HTTP session against the modem's web interface: one login, one status page fetch.
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use tracing::{debug, error, info};

use super::config::PollerConfig;
use crate::error::{PollError, PollStep};

pub const LOGIN_PATH: &str = "/goform/login";
pub const STATUS_PAGE_PATH: &str = "/user/feat-gateway-modem.asp";

pub struct ModemSession {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl ModemSession {
    /// The client keeps cookies, so the session cookie set by the login carries over
    /// to the status page request.
    pub fn new(config: &PollerConfig) -> Result<Self, PollError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub async fn login(&self) -> Result<(), PollError> {
        let url = format!("{}{LOGIN_PATH}", self.base_url);
        info!(url = %url, user = %self.username, "Logging in to modem.");

        let start_time = Instant::now();
        let response = self
            .client
            .post(&url)
            .form(&[("user", self.username.as_str()), ("pws", self.password.as_str())])
            .send()
            .await
            .map_err(|e| log_transport_error(PollStep::Login, e))?;
        debug!(
            status = %response.status(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Login response received."
        );

        ensure_success(PollStep::Login, response.status())
    }

    pub async fn fetch_status_page(&self) -> Result<Vec<u8>, PollError> {
        let url = format!("{}{STATUS_PAGE_PATH}", self.base_url);
        info!(url = %url, "Fetching modem status page.");

        let start_time = Instant::now();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| log_transport_error(PollStep::StatusPage, e))?;
        ensure_success(PollStep::StatusPage, response.status())?;

        let body = response
            .bytes()
            .await
            .map_err(|e| log_transport_error(PollStep::StatusPage, e))?;
        debug!(
            bytes = body.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Status page received."
        );
        Ok(body.to_vec())
    }

    /// Logs in and returns the raw status page.
    pub async fn poll(&self) -> Result<Vec<u8>, PollError> {
        self.login().await?;
        self.fetch_status_page().await
    }
}

fn ensure_success(step: PollStep, status: StatusCode) -> Result<(), PollError> {
    if status.is_success() {
        Ok(())
    } else {
        error!(step = %step, status = %status, "Modem returned an unexpected status.");
        Err(PollError::UnexpectedStatus { step, status })
    }
}

fn log_transport_error(step: PollStep, e: reqwest::Error) -> PollError {
    if e.is_timeout() {
        error!(step = %step, "Request to modem timed out.");
    } else {
        error!(step = %step, error = %e, "Request to modem failed.");
    }
    PollError::Transport(e)
}
