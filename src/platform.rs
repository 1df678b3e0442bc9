//! Implementations of the flow's collaborators for our platform, PC:
//! an HTTP client for the account service, and a terminal notifier.

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use serde::Serialize;

use crate::notice::{NoticeStream, Severity};
use crate::service::{AccountService, OtpRequest, OtpVerification, Registration, ServiceError, ServiceReply};

/// Where the account service lives, and how long to wait for it
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// The account service, reached over HTTP with JSON bodies
pub struct HttpAccountService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAccountService {
    pub fn new(config: &Config) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let base_url = config.base_url.trim_end_matches('/').to_owned();
        info!("account service at {}", base_url);
        Ok(Self { client, base_url })
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ServiceReply, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|error| ServiceError::Transport(error.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|error| ServiceError::Transport(error.to_string()))?;
        debug!("{} answered {}", url, status);

        if !status.is_success() {
            // the body may explain, or may not be JSON at all
            let message = serde_json::from_slice::<ServiceReply>(&bytes)
                .ok()
                .and_then(|reply| reply.message);
            return Err(ServiceError::Rejected { status: status.as_u16(), message });
        }

        if bytes.is_empty() {
            return Ok(ServiceReply::default());
        }
        serde_json::from_slice(&bytes).map_err(|error| ServiceError::Decode(error.to_string()))
    }
}

#[async_trait]
impl AccountService for HttpAccountService {
    async fn request_otp(&self, request: &OtpRequest) -> Result<ServiceReply, ServiceError> {
        self.post("/user/send-otp", request).await
    }

    async fn verify_otp(&self, request: &OtpVerification) -> Result<ServiceReply, ServiceError> {
        self.post("/user/verify-otp", request).await
    }

    async fn register(&self, request: &Registration) -> Result<ServiceReply, ServiceError> {
        self.post("/user/register", request).await
    }
}

/// Writes every notice already emitted, without waiting for more. Returns how many there were.
pub fn write_pending<O, E>(notices: &mut NoticeStream, out: &mut O, err: &mut E) -> std::io::Result<usize>
where
    O: Write,
    E: Write,
{
    let mut written = 0;
    while let Some(notice) = notices.try_next() {
        match notice.severity {
            Severity::Info | Severity::Success => writeln!(out, "{}", notice)?,
            Severity::Warning | Severity::Error => writeln!(err, "{}", notice)?,
        }
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

/// [`write_pending`] to the terminal: good news on stdout, the rest on stderr.
pub fn print_pending(notices: &mut NoticeStream) -> std::io::Result<usize> {
    write_pending(notices, &mut std::io::stdout(), &mut std::io::stderr())
}
