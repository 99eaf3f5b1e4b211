/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 7/9/24
******************************************************************************/
use crate::config::Config;
use crate::presentation::serialization::Serializer;
use crate::session::auth::PlatformAuth;
use crate::session::interface::{Authenticator, SessionCookie};
use crate::transport::http_client::PlatformHttpClient;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const LOGOUT_ENDPOINT: &str = "/accounts/logout/";

/// Holds the HTTP client and the current session cookie.
///
/// The cookie is only replaced by `authenticate`, `restore` or `logout`; every
/// request made through a client built from this session reads it.
#[derive(Debug)]
pub struct Session {
    client: Arc<PlatformHttpClient>,
    config: Config,
    cookie: Option<SessionCookie>,
}

impl Session {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = PlatformHttpClient::new(&config.rest_api)?;
        Ok(Self {
            client: Arc::new(client),
            config,
            cookie: None,
        })
    }

    /// Builds a session from a previously dumped cookie file and reports its expiration.
    pub fn from_cookie_file<P: AsRef<Path>>(config: Config, path: P) -> anyhow::Result<Self> {
        let mut session = Self::new(config)?;
        session.restore(path)?;
        Ok(session)
    }

    #[instrument(skip(self))]
    pub async fn authenticate(&mut self) -> anyhow::Result<()> {
        let auth = PlatformAuth::new(&self.config, self.client.clone());
        let cookie = auth.login().await.context("Failed to authenticate")?;
        self.cookie = Some(cookie);
        info!("Authenticated as {}", self.config.credentials.username);
        Ok(())
    }

    /// Logs in again when there is no cookie or the cookie has expired.
    #[instrument(skip(self))]
    pub async fn ensure_auth(&mut self) -> anyhow::Result<()> {
        if !self.is_expired() {
            return Ok(());
        }
        debug!("Session missing or expired, re-authenticating");
        self.authenticate().await
    }

    /// A session without a cookie counts as expired.
    pub fn is_expired(&self) -> bool {
        self.cookie.as_ref().map_or(true, |c| c.is_expired())
    }

    /// Logs the cookie expiration and returns it.
    pub fn check_cookie(&self) -> Option<DateTime<Utc>> {
        let cookie = self.cookie.as_ref()?;
        let expiration = cookie.expires_at_datetime();
        if cookie.is_expired() {
            warn!("Cookie expired {}", expiration);
        } else {
            info!("Cookie expires {}", expiration);
        }
        Some(expiration)
    }

    pub fn restore<P: AsRef<Path>>(&mut self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let cookie: SessionCookie = Serializer::read_json_file(path)
            .with_context(|| format!("Failed to restore session from {}", path.display()))?;
        self.cookie = Some(cookie);
        self.check_cookie();
        Ok(())
    }

    pub fn dump_cookie<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let cookie = self
            .cookie
            .as_ref()
            .context("No session cookie to dump, authenticate first")?;
        Serializer::write_json_file(path.as_ref(), cookie)?;
        debug!("Session cookie written to {}", path.as_ref().display());
        Ok(())
    }

    /// Dumps the cookie to the path configured in `session.cookie_path`.
    pub fn dump_cookie_default(&self) -> anyhow::Result<()> {
        self.dump_cookie(&self.config.session.cookie_path)
    }

    pub async fn logout(&mut self) -> anyhow::Result<()> {
        if let Some(cookie) = &self.cookie {
            self.client
                .post_empty::<serde_json::Value>(LOGOUT_ENDPOINT, &cookie.cookie)
                .await
                .context("Failed to logout")?;
        }
        self.cookie = None;
        Ok(())
    }

    pub fn cookie(&self) -> Option<&SessionCookie> {
        self.cookie.as_ref()
    }

    pub fn http_client(&self) -> Arc<PlatformHttpClient> {
        self.client.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"client\":{},\"config\":{},\"cookie\":{}}}",
            self.client,
            self.config,
            self.cookie
                .as_ref()
                .map_or("null".to_string(), |c| c.to_string())
        )
    }
}

#[cfg(test)]
mod tests_session {
    use super::*;
    use crate::utils::logger::setup_logger;
    use mockito::Server;
    use pretty_assertions::assert_eq;

    const LOGIN_BODY: &str = r#"{"logged_in_user": {"pk": 7, "username": "test_user"}, "status": "ok"}"#;

    fn create_test_config(server_url: &str) -> Config {
        let mut config = Config::new();
        config.rest_api.base_url = server_url.to_string();
        config.credentials.username = "test_user".to_string();
        config.credentials.password = "test_password".to_string();
        config
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        setup_logger();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/accounts/login/")
            .with_status(200)
            .with_header("set-cookie", "sessionid=abc; Path=/")
            .with_body(LOGIN_BODY)
            .create_async()
            .await;

        let mut session = Session::new(create_test_config(&server.url())).unwrap();
        assert!(session.is_expired());

        session.authenticate().await.unwrap();

        assert!(!session.is_expired());
        assert_eq!(session.cookie().unwrap().cookie, "sessionid=abc");
        assert!(session.check_cookie().is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_authenticate_failure() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/accounts/login/")
            .with_status(401)
            .with_body("Unauthorized")
            .create_async()
            .await;

        let mut session = Session::new(create_test_config(&server.url())).unwrap();
        let result = session.authenticate().await;

        assert!(result.is_err());
        assert!(session.cookie().is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ensure_auth_when_already_authenticated() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/accounts/login/")
            .with_status(200)
            .with_header("set-cookie", "sessionid=abc; Path=/")
            .with_body(LOGIN_BODY)
            .expect(1)
            .create_async()
            .await;

        let mut session = Session::new(create_test_config(&server.url())).unwrap();
        session.authenticate().await.unwrap();
        session.ensure_auth().await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ensure_auth_when_cookie_expired() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/accounts/login/")
            .with_status(200)
            .with_header("set-cookie", "sessionid=fresh; Path=/")
            .with_body(LOGIN_BODY)
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookie.json");
        let stale = SessionCookie {
            cookie: "sessionid=stale".to_string(),
            user_id: Some(7),
            expires_at: 1_000,
        };
        Serializer::write_json_file(&path, &stale).unwrap();

        let mut session = Session::from_cookie_file(create_test_config(&server.url()), &path).unwrap();
        assert!(session.is_expired());

        session.ensure_auth().await.unwrap();
        assert_eq!(session.cookie().unwrap().cookie, "sessionid=fresh");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_dump_and_restore_cookie() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/accounts/login/")
            .with_status(200)
            .with_header("set-cookie", "sessionid=abc; Path=/")
            .with_body(LOGIN_BODY)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insta_cookie.json");

        let mut session = Session::new(create_test_config(&server.url())).unwrap();
        assert!(session.dump_cookie(&path).is_err());
        session.authenticate().await.unwrap();
        session.dump_cookie(&path).unwrap();

        let restored = Session::from_cookie_file(create_test_config(&server.url()), &path).unwrap();
        assert_eq!(restored.cookie(), session.cookie());
        assert!(!restored.is_expired());
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let mut server = Server::new_async().await;
        let _login = server
            .mock("POST", "/accounts/login/")
            .with_status(200)
            .with_header("set-cookie", "sessionid=abc; Path=/")
            .with_body(LOGIN_BODY)
            .create_async()
            .await;
        let logout = server
            .mock("POST", "/accounts/logout/")
            .match_header("Cookie", "sessionid=abc")
            .with_status(200)
            .with_body(r#"{"status": "ok"}"#)
            .create_async()
            .await;

        let mut session = Session::new(create_test_config(&server.url())).unwrap();
        session.authenticate().await.unwrap();
        session.logout().await.unwrap();

        assert!(session.cookie().is_none());
        logout.assert_async().await;
    }

    #[test]
    fn test_session_display_redacts_secrets() {
        let mut config = Config::new();
        config.rest_api.base_url = "https://api.example.com".to_string();
        let session = Session::new(config).unwrap();

        let display_output = session.to_string();
        let value: serde_json::Value = serde_json::from_str(&display_output).unwrap();
        assert_eq!(value["client"]["base_url"], "https://api.example.com");
        assert_eq!(value["config"]["credentials"]["password"], "[REDACTED]");
        assert!(value["cookie"].is_null());
    }
}
