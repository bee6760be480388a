use thiserror::Error;

#[derive(Error, Debug)]
pub enum TwofaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid HMAC key: {0}")]
    InvalidKey(String),

    #[error("System clock error: {0}")]
    Clock(String),

    #[error("QR code error: {0}")]
    Qr(String),

    #[error("MFA setup not started")]
    SetupNotStarted,

    #[error("MFA is not enabled")]
    NotEnabled,

    #[error("Invalid verification code")]
    InvalidCode,
}

impl From<config::ConfigError> for TwofaError {
    fn from(err: config::ConfigError) -> Self {
        TwofaError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TwofaError>;
