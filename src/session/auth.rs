use crate::application::models::post::LoginResponse;
use crate::config::Config;
use crate::error::{AppError, AuthError};
use crate::session::interface::{Authenticator, SessionCookie};
use crate::transport::http_client::PlatformHttpClient;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, instrument};

const LOGIN_ENDPOINT: &str = "/accounts/login/";

/// Username/password login against the private API.
pub struct PlatformAuth<'a> {
    cfg: &'a Config,
    client: Arc<PlatformHttpClient>,
}

impl<'a> PlatformAuth<'a> {
    pub fn new(cfg: &'a Config, client: Arc<PlatformHttpClient>) -> Self {
        Self { cfg, client }
    }
}

#[async_trait::async_trait]
impl<'a> Authenticator for PlatformAuth<'a> {
    #[instrument(skip(self))]
    async fn login(&self) -> Result<SessionCookie, AuthError> {
        debug!("Authenticating user: {}", self.cfg.credentials.username);

        let form = [
            ("username", self.cfg.credentials.username.as_str()),
            ("password", self.cfg.credentials.password.as_str()),
        ];
        let (response, cookies): (LoginResponse, Vec<String>) =
            match self.client.post_form(LOGIN_ENDPOINT, &form).await {
                Ok(ok) => ok,
                Err(AppError::Unauthorized) | Err(AppError::Unexpected(reqwest::StatusCode::BAD_REQUEST)) => {
                    return Err(AuthError::BadCredentials)
                }
                Err(e) => return Err(e.into()),
            };

        if response.status != "ok" {
            return Err(AuthError::Other(format!("login status {}", response.status)));
        }
        if cookies.is_empty() {
            return Err(AuthError::Other("login response carried no session cookie".to_string()));
        }

        let expires_at = Utc::now() + Duration::days(self.cfg.session.ttl_days);
        debug!("Authentication successful, session valid until {}", expires_at);

        Ok(SessionCookie {
            cookie: cookies.join("; "),
            user_id: Some(response.logged_in_user.pk),
            expires_at: expires_at.timestamp(),
        })
    }
}
