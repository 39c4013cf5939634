//! HTTP error responses.
//!
//! Errors are returned as plain text. Internal errors carry a fixed message;
//! provider and store details stay in the logs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::Error;

#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed request input (400).
    BadRequest(String),
    /// Generation failed (500).
    Internal(&'static str),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a service error; anything but a validation error becomes `fallback`.
    pub fn from_error(err: Error, fallback: &'static str) -> Self {
        match err {
            Error::Validation { message, .. } => Self::BadRequest(message),
            _ => Self::Internal(fallback),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Self::BadRequest(message) => (status, message).into_response(),
            Self::Internal(message) => (status, message).into_response(),
        }
    }
}
