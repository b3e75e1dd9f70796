use thiserror::Error;

/// Failure talking to the remote photo API.
///
/// These never escape the feed: [`crate::feed::GalleryFeed`] logs them and
/// reports the page as absent.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Transport level failure (DNS, connect, TLS, timeout, reset).
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("unexpected response status {0}")]
    Status(reqwest::StatusCode),

    /// The body was not a valid photo listing.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL could not be joined with an endpoint path.
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

/// Coarse classification used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Decode,
}

impl FeedError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network(err) if err.is_decode() => FailureKind::Decode,
            Self::Network(_) | Self::Status(_) | Self::Url(_) => FailureKind::Network,
            Self::Decode(_) => FailureKind::Decode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_decode_failures_are_classified() {
        let status = FeedError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status.kind(), FailureKind::Network);

        let decode = FeedError::from(serde_json::from_str::<u32>("nope").unwrap_err());
        assert_eq!(decode.kind(), FailureKind::Decode);
        assert!(decode.to_string().starts_with("malformed response body"));
    }
}
