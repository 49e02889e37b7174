//! Error types for the rotation strategy

use crate::types::SecurityId;
use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for strategy operations
#[derive(Error, Debug)]
pub enum StrategyError {
    /// Malformed or empty membership dataset, or an invalid strategy configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A removal event targets a security that is not a current member.
    ///
    /// Indicates corrupt reference data; fatal to the run.
    #[error("Membership consistency error: {security} removed on {date} but is not a current member")]
    Consistency {
        security: SecurityId,
        date: NaiveDate,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Execution simulator rejected a request
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Fundamentals provider failure
    #[error("Fundamentals error: {0}")]
    FundamentalsError(String),

    /// Strategy hook called before initialization
    #[error("Strategy not initialized")]
    NotInitialized,

    /// Insufficient data for a run
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Backtesting error
    #[error("Backtest error: {0}")]
    BacktestError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StrategyError {
    /// Whether the error comes from the membership reference data itself
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            StrategyError::ConfigError(_) | StrategyError::Consistency { .. }
        )
    }
}

/// Result type for strategy operations
pub type StrategyResult<T> = Result<T, StrategyError>;
