use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Flow errors
    #[error("Scanner busy: a scan is already in flight")]
    ScannerBusy,

    #[error("Invalid phase transition from {from} to {to}")]
    InvalidPhaseTransition { from: String, to: String },

    // Validation errors
    #[error("Invalid user name: {0}")]
    InvalidUserName(String),

    #[error("Invalid user role: {0}")]
    InvalidRole(String),
}

pub type Result<T> = std::result::Result<T, Error>;
