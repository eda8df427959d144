//! Library error taxonomy.
//!
//! Only two conditions are worth surfacing to the host; everything else in
//! the update flow (duplicate requests, unresolvable store clients, failed
//! notices) is an expected race or an absent optional capability and is
//! handled as a logged no-op.

/// Errors reported to the host application.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    /// An entry point ran before the host established configuration.
    /// This is a programming error on the host side, never defaulted away.
    #[error("Update configuration was not set before use")]
    ConfigurationNotSet,

    /// The builder rejected the supplied configuration. Raised at build
    /// time only, never at use time.
    #[error("Invalid update configuration: {reason}")]
    InvalidConfiguration { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = UpdateError::InvalidConfiguration {
            reason: "app id must be provided".to_string(),
        };
        assert!(err.to_string().contains("app id must be provided"));
        assert!(UpdateError::ConfigurationNotSet.to_string().contains("not set"));
    }
}
