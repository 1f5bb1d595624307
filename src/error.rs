use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failures observed while streaming.
///
/// These are recorded as the adapter's last error and handed to the
/// `on_error` hook; they are never returned from `connect()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The channel could not be opened.
    #[error("could not open {transport} channel: {reason}")]
    TransportConnect {
        transport: &'static str,
        reason: String,
    },

    /// The channel failed after it was established.
    #[error("{transport} channel failed: {reason}")]
    TransportRuntime {
        transport: &'static str,
        reason: String,
    },

    /// A payload failed to parse or validate and was dropped.
    #[error("data processing failed: {0}")]
    DataProcessing(String),

    /// One polling request failed; the next cycle still runs.
    #[error("polling failed: {0}")]
    PollingCycle(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_error_messages_name_the_transport() {
        let err = StreamError::TransportConnect {
            transport: "websocket",
            reason: "refused".into(),
        };
        assert_eq!(err.to_string(), "could not open websocket channel: refused");
    }

    #[test]
    fn url_errors_convert_into_crate_error() {
        let err: Error = url::Url::parse("feed.test/stream").unwrap_err().into();
        assert!(matches!(err, Error::Url(url::ParseError::RelativeUrlWithoutBase)));
    }

    #[test]
    fn config_error_converts_into_crate_error() {
        let err: Error = ConfigError::MissingField { field: "endpoint" }.into();
        assert_eq!(err.to_string(), "missing required field: endpoint");
    }

    #[test]
    fn stream_error_converts_into_crate_error() {
        let err: Error = StreamError::PollingCycle("timeout".into()).into();
        assert!(matches!(err, Error::Stream(StreamError::PollingCycle(_))));
    }
}
