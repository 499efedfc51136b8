//! Error mapping guide:
//! - Every variant is fatal and maps to exit code 1; child exit codes never pass through here.
//! - Display renders the exact user-facing `!` line; callers print it unchanged.
//! - Validation failures keep their own enum (Rejection) so the pure validator has no I/O types.
use std::fmt;
use std::io;

use crate::validate::Rejection;

/// Errors that terminate a proxy session.
#[derive(Debug)]
pub enum ProxyError {
    MissingToken,
    InvalidUrl(String),
    EncodeRequest,
    BuildRequest,
    SendRequest,
    Rejected(Rejection),
    RepeatedConfirmation,
    ConfirmationRead,
    ConfirmationOutput,
    ReadBody(io::Error),
    Spawn(io::Error),
    Signaled(String),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::MissingToken => write!(
                f,
                "! Personal access token must be provided in UBI_TOKEN env variable for use"
            ),
            ProxyError::InvalidUrl(reason) => write!(f, "! Invalid UBI_URL: {reason}"),
            ProxyError::EncodeRequest => write!(f, "! Error encoding request body"),
            ProxyError::BuildRequest => write!(f, "! Error creating http request"),
            ProxyError::SendRequest => write!(f, "! Error sending http request"),
            ProxyError::Rejected(r) => write!(f, "! Invalid server response, {r}"),
            ProxyError::RepeatedConfirmation => write!(
                f,
                "! Invalid server response, repeated confirmation attempt"
            ),
            ProxyError::ConfirmationRead => write!(f, "! Error reading confirmation"),
            ProxyError::ConfirmationOutput => {
                write!(f, "! Error copying response body to stdout")
            }
            ProxyError::ReadBody(e) => write!(f, "! Error reading response body: {e}"),
            ProxyError::Spawn(e) => write!(f, "! Error executing program: {e}"),
            ProxyError::Signaled(sig) => write!(f, "! Program terminated by signal {sig}"),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::ReadBody(e) | ProxyError::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Rejection> for ProxyError {
    fn from(r: Rejection) -> Self {
        ProxyError::Rejected(r)
    }
}

/// Exit code for a fatal session error.
///
/// Takes the error so `main` maps every failure through one place, like the
/// other `exit_code_for_*` helpers. Every variant is currently 1; only a
/// child's own status, which never becomes a `ProxyError`, may differ.
pub fn exit_code_for_proxy_error(_e: &ProxyError) -> u8 {
    1
}
