use thiserror::Error;

/// Failure talking to the DoctorMate API.
///
/// `Transport` and `Status` are the expected degraded mode (service down,
/// token rejected, timeout). `Decode` means the upstream answered 2xx with a
/// body we could not read, which usually points at schema drift.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl DirectoryError {
    /// Whether this failure is part of normal degraded operation rather than a likely bug.
    pub fn is_expected(&self) -> bool {
        !matches!(self, DirectoryError::Decode { .. })
    }
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
