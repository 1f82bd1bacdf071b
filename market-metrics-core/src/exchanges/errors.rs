//! Error types for the metrics pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot read symbol list {path}: {source}")]
    SymbolSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Export to {path} failed: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Subscriber {subscriber} failed: {message}")]
    Subscriber { subscriber: String, message: String },

    #[error("Subscriber {subscriber} panicked: {message}")]
    SubscriberPanic { subscriber: String, message: String },

    #[error("Invalid trade: {0}")]
    InvalidTrade(String),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

impl From<::config::ConfigError> for MetricsError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MetricsError::Subscriber {
            subscriber: "audit".to_string(),
            message: "disk full".to_string(),
        };
        assert_eq!(err.to_string(), "Subscriber audit failed: disk full");

        let err = MetricsError::from(::config::ConfigError::Message("bad key".to_string()));
        assert_eq!(err.to_string(), "Configuration error: bad key");
    }
}
