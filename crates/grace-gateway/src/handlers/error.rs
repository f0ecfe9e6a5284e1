//! Handler error types

use crate::protocol::CloseCode;
use grace_common::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(#[from] AppError),

    #[error("Already identified")]
    AlreadyIdentified,

    /// The outgoing channel is closed
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Close code to send before dropping the connection
    pub fn to_close_code(&self) -> CloseCode {
        match self {
            Self::InvalidPayload(_) => CloseCode::DecodeError,
            Self::AuthenticationFailed(_) => CloseCode::AuthenticationFailed,
            Self::AlreadyIdentified => CloseCode::AlreadyIdentified,
            Self::ConnectionClosed | Self::Internal(_) => CloseCode::UnknownError,
        }
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;
