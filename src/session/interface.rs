use crate::error::AuthError;
use crate::utils::time::unix_to_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated session as persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionCookie {
    /// `name=value` pairs joined with `; `, sent verbatim as the `Cookie` header.
    pub cookie: String,
    pub user_id: Option<u64>,
    /// Epoch seconds.
    pub expires_at: i64,
}

impl SessionCookie {
    pub fn expires_at_datetime(&self) -> DateTime<Utc> {
        unix_to_datetime(self.expires_at)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at_datetime() <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"cookie\":\"[REDACTED]\",\"user_id\":{},\"expires_at\":{}}}",
            self.user_id.map_or("null".to_string(), |id| id.to_string()),
            self.expires_at
        )
    }
}

#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self) -> Result<SessionCookie, AuthError>;
}
