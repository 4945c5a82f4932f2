use thiserror::Error;
use tickr_core::{
    ConfigError, GatewayError, GatewayErrorKind, SessionError, ValidationError, WatchlistError,
};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    Auth(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<WatchlistError> for CliError {
    fn from(error: WatchlistError) -> Self {
        match error {
            WatchlistError::Validation(error) => Self::Validation(error),
            WatchlistError::Gateway(error) => Self::Gateway(error),
        }
    }
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Config(_) => 2,
            Self::Gateway(error) if error.kind() == GatewayErrorKind::Decode => 4,
            Self::Gateway(_) | Self::Auth(_) => 3,
            Self::Serialization(_) | Self::Session(SessionError::Corrupt(_)) => 4,
            Self::Session(_) | Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_category() {
        assert_eq!(CliError::from(ValidationError::EmptyWatchlistName).exit_code(), 2);
        assert_eq!(
            CliError::from(GatewayError::from_status(503, "down")).exit_code(),
            3
        );
        assert_eq!(CliError::from(GatewayError::decode("bad body")).exit_code(), 4);
        assert_eq!(
            CliError::from(std::io::Error::other("disk full")).exit_code(),
            10
        );
    }

    #[test]
    fn watchlist_errors_keep_their_category() {
        let error = CliError::from(WatchlistError::Gateway(GatewayError::unauthorized(
            "session expired",
        )));
        assert!(matches!(error, CliError::Gateway(_)));
        assert_eq!(error.exit_code(), 3);
    }
}
