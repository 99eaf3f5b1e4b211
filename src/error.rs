/******************************************************************************
    Author: Joaquín Béjar García
    Email: jb@taunais.com
    Date: 12/5/25
 ******************************************************************************/
use reqwest::StatusCode;
use std::fmt::{Display, Formatter};
use std::{fmt, io};

#[derive(Debug)]
pub enum AuthError {
    Network(reqwest::Error),
    Io(io::Error),
    Json(serde_json::Error),
    Other(String),
    BadCredentials,
    Unexpected(StatusCode),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Network(e) => write!(f, "network error: {e}"),
            AuthError::Io(e)      => write!(f, "io error: {e}"),
            AuthError::Json(e)    => write!(f, "json error: {e}"),
            AuthError::Other(msg) => write!(f, "other error: {msg}"),
            AuthError::BadCredentials => write!(f, "bad credentials"),
            AuthError::Unexpected(s) => write!(f, "unexpected http status: {s}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self { AuthError::Network(e) }
}
impl From<io::Error> for AuthError {
    fn from(e: io::Error) -> Self { AuthError::Io(e) }
}
impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self { AuthError::Json(e) }
}
impl From<AppError> for AuthError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Network(e) => AuthError::Network(e),
            AppError::Io(e)      => AuthError::Io(e),
            AppError::Json(e)    => AuthError::Json(e),
            AppError::Unauthorized => AuthError::BadCredentials,
            AppError::Unexpected(s) => AuthError::Unexpected(s),
            other => AuthError::Other(other.to_string()),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    Network(reqwest::Error),
    Io(io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
    Unexpected(StatusCode),
    Unauthorized,
    NotFound,
    RateLimitExceeded,
    Cancelled,
    Render(String),
    SerializationError(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Network(e)   => write!(f, "network error: {e}"),
            AppError::Io(e)        => write!(f, "io error: {e}"),
            AppError::Json(e)      => write!(f, "json error: {e}"),
            AppError::Csv(e)       => write!(f, "csv error: {e}"),
            AppError::Unexpected(s)=> write!(f, "unexpected http status: {s}"),
            AppError::Unauthorized  => write!(f, "unauthorized"),
            AppError::NotFound      => write!(f, "not found"),
            AppError::RateLimitExceeded => write!(f, "rate limit exceeded"),
            AppError::Cancelled     => write!(f, "operation cancelled"),
            AppError::Render(s)     => write!(f, "render error: {s}"),
            AppError::SerializationError(s) => write!(f, "serialization error: {s}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self { AppError::Network(e) }
}
impl From<io::Error> for AppError {
    fn from(e: io::Error) -> Self { AppError::Io(e) }
}
impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self { AppError::Json(e) }
}
impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self { AppError::Csv(e) }
}
impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Network(e) => AppError::Network(e),
            AuthError::Io(e)      => AppError::Io(e),
            AuthError::Json(e)    => AppError::Json(e),
            AuthError::BadCredentials => AppError::Unauthorized,
            AuthError::Unexpected(s) => AppError::Unexpected(s),
            AuthError::Other(_) => AppError::Unexpected(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

/// Raised when a metric cannot be computed from the data at hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricError {
    /// Engagement rate is undefined for an account without followers.
    ZeroFollowers,
}

impl Display for MetricError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MetricError::ZeroFollowers => write!(f, "engagement rate undefined: follower count is 0"),
        }
    }
}

impl std::error::Error for MetricError {}

/// Data conditions that do not stop a run but that the caller should know about.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// The feed returned nothing for the requested window, even after the retry.
    EmptyFeed { user_id: u64, since: i64 },
    /// A page came back without moving the cursor past the previous oldest post.
    CursorStalled { max_id: String },
    /// Follower count was zero, engagement rates are left undefined.
    ZeroFollowers { user_id: u64 },
    /// More rows were requested than the table holds.
    TopNClamped { requested: usize, available: usize },
    /// Comments of one post could not be read while mining hashtags.
    CommentFetchFailed { post_id: String, reason: String },
    /// An engager's own feed could not be read (usually a private account).
    EngagerInaccessible { user_id: u64, reason: String },
}

impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Warning::EmptyFeed { user_id, since } => {
                write!(f, "user {user_id} has no posts since {since}")
            }
            Warning::CursorStalled { max_id } => {
                write!(f, "pagination cursor did not advance past {max_id}")
            }
            Warning::ZeroFollowers { user_id } => {
                write!(f, "user {user_id} has no followers, engagement rate undefined")
            }
            Warning::TopNClamped { requested, available } => {
                write!(f, "{requested} is larger than the table length {available}, using {available}")
            }
            Warning::CommentFetchFailed { post_id, reason } => {
                write!(f, "failed to fetch comments of post {post_id}: {reason}")
            }
            Warning::EngagerInaccessible { user_id, reason } => {
                write!(f, "feed of user {user_id} is not accessible: {reason}")
            }
        }
    }
}

/// A value together with the warnings raised while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reported<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Reported<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<Warning>) -> Self {
        Self { value, warnings }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

#[cfg(test)]
mod tests_error {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_auth_error_into_app_error() {
        let err: AppError = AuthError::BadCredentials.into();
        assert!(matches!(err, AppError::Unauthorized));

        let err: AppError = AuthError::Unexpected(StatusCode::BAD_GATEWAY).into();
        assert_eq!(err.to_string(), "unexpected http status: 502 Bad Gateway");
    }

    #[test]
    fn test_app_error_into_auth_error() {
        let err: AuthError = AppError::Unauthorized.into();
        assert!(matches!(err, AuthError::BadCredentials));

        let err: AuthError = AppError::Cancelled.into();
        assert_eq!(err.to_string(), "other error: operation cancelled");
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::TopNClamped {
            requested: 20,
            available: 3,
        };
        assert_eq!(
            warning.to_string(),
            "20 is larger than the table length 3, using 3"
        );
        assert_eq!(
            MetricError::ZeroFollowers.to_string(),
            "engagement rate undefined: follower count is 0"
        );
    }

    #[test]
    fn test_reported() {
        let reported = Reported::with_warnings(3, vec![Warning::ZeroFollowers { user_id: 1 }]);
        assert!(reported.has_warnings());
        assert_eq!(reported.into_inner(), 3);
        assert!(!Reported::new("ok").has_warnings());
    }
}
