//! Error types for fetching and index builds.
//!
//! Neither error escapes the query surface: fetch failures are absorbed
//! per page (or trigger the fallback path list during discovery), and a
//! failed build leaves the previously held index in place.

use thiserror::Error;

/// Failure to retrieve one page from the documentation site.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("failed to fetch {url}: HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The request never produced a response (DNS, TLS, timeout, body read).
    #[error("failed to fetch {url}: {source}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        source: reqwest::Error,
    },
}

impl FetchError {
    /// HTTP status carried by the error, if the server responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
        }
    }
}

/// Failure of a whole index build pass.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Every discovered page failed to fetch or normalize.
    #[error("no pages could be indexed from {discovered} discovered paths")]
    NoPages {
        /// Number of paths discovery produced.
        discovered: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = FetchError::Status {
            url: "https://example.com/docs".to_string(),
            status: 503,
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(
            err.to_string(),
            "failed to fetch https://example.com/docs: HTTP 503"
        );
    }

    #[test]
    fn test_no_pages_message() {
        let err = BuildError::NoPages { discovered: 6 };
        assert!(err.to_string().contains("6 discovered paths"));
    }
}
