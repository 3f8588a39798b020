//! Client errors.
//!
//! Only construction-time failures ever reach the caller; everything that
//! happens after `run` starts is absorbed by the reconnect loop and logged.

use tapfeed_core::GroupConfigError;

/// Feed client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Exclusive-group configuration was rejected at compile time.
    #[error(transparent)]
    GroupConfig(#[from] GroupConfigError),

    /// Client configuration failed validation.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Opening the transport connection timed out.
    #[error("connect to {endpoint} timed out")]
    ConnectTimeout {
        /// Feed endpoint that was dialed
        endpoint: String,
    },

    /// Opening the transport connection failed.
    #[error("connect to {endpoint} failed: {reason}")]
    ConnectFailed {
        /// Feed endpoint that was dialed
        endpoint: String,
        /// Underlying transport failure
        reason: String,
    },
}
