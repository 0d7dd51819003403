use std::fmt;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::modem_modules::fields::FieldError;

/// The two HTTP requests that make up one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    Login,
    StatusPage,
}

impl fmt::Display for PollStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollStep::Login => f.write_str("login"),
            PollStep::StatusPage => f.write_str("status page"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PollError {
    #[error("Request to modem failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Modem rejected {step} request with status {status}")]
    UnexpectedStatus { step: PollStep, status: StatusCode },
    #[error("Status field {key:?} could not be decoded: {source}")]
    MalformedField {
        key: String,
        #[source]
        source: FieldError,
    },
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid poller config: {0}")]
    InvalidConfig(String),
    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),
    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}
