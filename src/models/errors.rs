use reqwest::StatusCode;
use thiserror::Error;

pub const NO_TOKEN_MESSAGE: &str = "No token found. Please log in.";

/// Failures reported by the library API client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("registration failed: {0}")]
    Registration(String),
}

impl ApiError {
    pub fn missing_token() -> Self {
        ApiError::Auth(NO_TOKEN_MESSAGE.to_string())
    }

    /// Maps a non-success HTTP status to the error taxonomy.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
            StatusCode::CONFLICT => ApiError::Conflict(message),
            _ => ApiError::Network(message),
        }
    }

    /// Login never distinguishes why it failed.
    pub fn into_login_failure(self) -> Self {
        match self {
            ApiError::Auth(message) => ApiError::Auth(message),
            other => ApiError::Auth(other.detail().to_string()),
        }
    }

    /// Registration keeps validation and conflict apart, everything else is generic.
    pub fn into_registration_failure(self) -> Self {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => self,
            other => ApiError::Registration(other.detail().to_string()),
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            ApiError::Auth(message)
            | ApiError::Validation(message)
            | ApiError::NotFound(message)
            | ApiError::Network(message)
            | ApiError::Conflict(message)
            | ApiError::Registration(message) => message,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }

    /// Sentence shown to the user in place of the raw failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Auth(message) if message == NO_TOKEN_MESSAGE => message.clone(),
            ApiError::Auth(_) => "Access forbidden. Please check your login status or permissions.".to_string(),
            ApiError::Validation(message) => message.clone(),
            ApiError::NotFound(_) => "The requested book no longer exists.".to_string(),
            ApiError::Network(_) => "Could not reach the library. Please try again.".to_string(),
            ApiError::Conflict(_) => "An account with this email already exists.".to_string(),
            ApiError::Registration(_) => "Registration failed. Please try again.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file format: {0}")]
    Format(#[from] serde_yaml::Error),
}
