use axum::http::StatusCode;
use thiserror::Error;

/// Errors surfaced by progress stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("progress backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("no progress record for day {0}")]
    RecordNotFound(u32),
    #[error("no signed-in user")]
    IdentityMissing,
}

impl StoreError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}

/// Errors emitted by `Tracker::toggle`.
#[derive(Debug, Error)]
pub enum ToggleError {
    #[error("day {0} is not part of the curriculum")]
    UnknownDay(u32),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors emitted by identity providers.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("please enter a valid email address")]
    InvalidEmail,
    #[error("no signed-in user")]
    Missing,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

impl IdentityError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn unavailable(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::IdentityMissing => Self::unauthorized(err.to_string()),
            StoreError::RecordNotFound(_) => Self::not_found(err.to_string()),
            StoreError::BackendUnavailable(_) => Self::unavailable(err),
        }
    }
}

impl From<ToggleError> for AppError {
    fn from(err: ToggleError) -> Self {
        match err {
            ToggleError::UnknownDay(_) => Self::not_found(err.to_string()),
            ToggleError::Store(err) => err.into(),
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidEmail => Self::bad_request(err.to_string()),
            IdentityError::Missing => Self::unauthorized(err.to_string()),
            IdentityError::Unavailable(_) => Self::unavailable(err),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
