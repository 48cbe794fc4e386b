// Error taxonomy. NoData and Unsupported are not errors: they travel as `Reading` values.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Session token rejected or expired; recoverable by re-authenticating.
    #[error("session credentials expired or rejected")]
    ExpiredCredentials,
    /// Transient or unexpected failure of a single backend call.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn is_expired_credentials(&self) -> bool {
        matches!(self, BackendError::ExpiredCredentials)
    }
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Invalid input format {0:?}. Please enter month and year as MM-YYYY.")]
    InvalidMonth(String),
    #[error("no profile given")]
    NoProfile,
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("output io: {0}")]
    Io(#[from] std::io::Error),
    #[error("xlsx: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("chart {path}: {message}")]
    Chart { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("re-authentication for profile {profile} failed: {source}")]
    Reauthentication {
        profile: String,
        #[source]
        source: BackendError,
    },
    #[error("credentials for profile {profile} still expired after {attempts} re-authentication attempt(s)")]
    CredentialsExhausted { profile: String, attempts: u32 },
}

impl ReportError {
    pub fn is_expired_credentials(&self) -> bool {
        matches!(self, ReportError::Backend(e) if e.is_expired_credentials())
    }
}
