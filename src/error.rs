use warp::{hyper::StatusCode, reject::Reject};

#[derive(thiserror::Error, Debug)]
pub enum BookstoreError {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("User already exists")]
    Conflict,
    #[error("Book not found")]
    NotFound,
    #[error("No review by this user")]
    NoSuchReview,
    #[error("error during storage operation")]
    Storage {
        #[from]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("error with token")]
    Token {
        #[from]
        source: jsonwebtoken::errors::Error,
    },
    #[error("error hashing password")]
    Hashing {
        #[from]
        source: argon2::Error,
    },
    #[error("password hashing task failed")]
    TaskJoin {
        #[from]
        source: tokio::task::JoinError,
    },
}

impl BookstoreError {
    pub const MISSING_TOKEN: Self = Self::Unauthenticated("Missing Bearer token");
    pub const INVALID_TOKEN: Self = Self::Unauthenticated("Invalid or expired token");
    pub const INVALID_CREDENTIALS: Self = Self::Unauthenticated("Invalid credentials");

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::NotFound | Self::NoSuchReview => StatusCode::NOT_FOUND,
            Self::Storage { .. } | Self::Token { .. } | Self::Hashing { .. } | Self::TaskJoin { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to hand back to the client.
    pub fn public_message(&self) -> String {
        if self.status().is_server_error() {
            "an unknown error has occurred".into()
        } else {
            self.to_string()
        }
    }
}

impl Reject for BookstoreError {}
