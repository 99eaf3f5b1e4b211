use crate::config::RestApiConfig;
use crate::constants::{APP_ID_HEADER_KEY, COOKIE_HEADER_KEY, SET_COOKIE_HEADER_KEY, USER_AGENT_HEADER_KEY};
use crate::error::AppError;
use anyhow::Context;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Represents the HTTP client for interacting with the platform's private API.
#[derive(Debug)]
pub struct PlatformHttpClient {
    client: Client,
    base_url: String,
}

impl PlatformHttpClient {
    /// Creates a new instance of the PlatformHttpClient.
    ///
    /// # Arguments
    ///
    /// * `config` - REST settings: base URL, timeout in seconds, user agent and app id.
    ///
    /// # Returns
    ///
    /// A Result containing the PlatformHttpClient instance or an error.
    pub fn new(config: &RestApiConfig) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            USER_AGENT_HEADER_KEY,
            header::HeaderValue::from_str(&config.user_agent)?,
        );
        headers.insert(
            APP_ID_HEADER_KEY,
            header::HeaderValue::from_str(&config.app_id)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Sends a GET request to `endpoint` with the given query pairs and session cookie.
    #[instrument(skip(self, cookie))]
    pub async fn get<T: DeserializeOwned + Debug>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        cookie: Option<&str>,
    ) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Sending GET request to {}", url);

        let mut request = self.client.get(&url).query(query);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE_HEADER_KEY, cookie);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to send GET request: {:?}", e);
                return Err(AppError::Network(e));
            }
        };

        Self::handle_response(response).await
    }

    /// Sends a form encoded POST request and returns the body together with every
    /// `name=value` pair the server set through `Set-Cookie`.
    #[instrument(skip(self, form))]
    pub async fn post_form<T: DeserializeOwned + Debug>(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
    ) -> Result<(T, Vec<String>), AppError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Sending POST request to {}", url);

        let response = self.client.post(&url).form(form).send().await?;
        let cookies = Self::extract_cookies(&response);
        debug!("Received {} cookies", cookies.len());

        let body = Self::handle_response(response).await?;
        Ok((body, cookies))
    }

    /// Sends a POST request without a body, authenticated with the session cookie.
    #[instrument(skip(self, cookie))]
    pub async fn post_empty<T: DeserializeOwned + Debug>(
        &self,
        endpoint: &str,
        cookie: &str,
    ) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Sending POST request to {}", url);

        let response = self
            .client
            .post(&url)
            .header(COOKIE_HEADER_KEY, cookie)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Downloads the raw body of an absolute URL, typically a CDN image.
    #[instrument(skip(self))]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, AppError> {
        debug!("Downloading {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            error!("Download failed. Status: {}", status);
            return Err(Self::status_error(status));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn handle_response<T: DeserializeOwned + Debug>(response: Response) -> Result<T, AppError> {
        let status = response.status();
        let body_text = response.text().await?;

        debug!("Response Status: {}", status);
        debug!("Response Body: {}", body_text);

        if status.is_success() {
            let body: T = serde_json::from_str(&body_text)?;
            Ok(body)
        } else {
            error!(
                "API request failed. Status: {}, Body: {}",
                status, body_text
            );
            Err(Self::status_error(status))
        }
    }

    fn status_error(status: StatusCode) -> AppError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized,
            StatusCode::NOT_FOUND => AppError::NotFound,
            StatusCode::TOO_MANY_REQUESTS => AppError::RateLimitExceeded,
            other => AppError::Unexpected(other),
        }
    }

    fn extract_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(SET_COOKIE_HEADER_KEY)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .filter_map(|h| h.split(';').next())
            .map(|pair| pair.trim().to_string())
            .filter(|pair| !pair.is_empty())
            .collect()
    }
}

impl fmt::Display for PlatformHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"base_url\":\"{}\"}}", self.base_url)
    }
}

#[cfg(test)]
mod tests_platform_http_client {
    use super::*;
    use crate::utils::logger::setup_logger;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;

    fn create_client(server: &Server) -> PlatformHttpClient {
        let config = RestApiConfig {
            base_url: server.url(),
            timeout: 5,
            user_agent: "test-agent".to_string(),
            app_id: "123".to_string(),
        };
        PlatformHttpClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_get_request_with_query_and_cookie() {
        setup_logger();
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", Matcher::Regex(r"^/test".to_string()))
            .match_query(Matcher::UrlEncoded("max_id".into(), "abc".into()))
            .match_header("Cookie", "sessionid=1")
            .match_header("User-Agent", "test-agent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "success"}"#)
            .create_async()
            .await;

        let client = create_client(&server);
        let result: serde_json::Value = client
            .get("/test", &[("max_id", "abc".to_string())], Some("sessionid=1"))
            .await
            .unwrap();

        assert_eq!(result["message"], "success");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_form_collects_cookies() {
        setup_logger();
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/accounts/login/")
            .match_body(Matcher::UrlEncoded("username".into(), "user".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("set-cookie", "sessionid=abc; Path=/; HttpOnly")
            .with_header("set-cookie", "ds_user_id=42; Path=/")
            .with_body(r#"{"status": "ok"}"#)
            .create_async()
            .await;

        let client = create_client(&server);
        let (body, cookies): (serde_json::Value, Vec<String>) = client
            .post_form("/accounts/login/", &[("username", "user"), ("password", "pw")])
            .await
            .unwrap();

        assert_eq!(body["status"], "ok");
        assert_eq!(cookies, vec!["sessionid=abc".to_string(), "ds_user_id=42".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_statuses_are_classified() {
        setup_logger();
        let mut server = Server::new_async().await;

        let _unauthorized = server
            .mock("GET", "/private")
            .with_status(401)
            .with_body("login_required")
            .create_async()
            .await;
        let _throttled = server
            .mock("GET", "/busy")
            .with_status(429)
            .with_body("Please wait a few minutes")
            .create_async()
            .await;
        let _teapot = server
            .mock("GET", "/teapot")
            .with_status(418)
            .create_async()
            .await;

        let client = create_client(&server);

        let result: Result<serde_json::Value, AppError> = client.get("/private", &[], None).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));

        let result: Result<serde_json::Value, AppError> = client.get("/busy", &[], None).await;
        assert!(matches!(result, Err(AppError::RateLimitExceeded)));

        let result: Result<serde_json::Value, AppError> = client.get("/teapot", &[], None).await;
        assert!(matches!(result, Err(AppError::Unexpected(StatusCode::IM_A_TEAPOT))));
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/broken")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let client = create_client(&server);
        let result: Result<serde_json::Value, AppError> = client.get("/broken", &[], None).await;
        assert!(matches!(result, Err(AppError::Json(_))));
    }

    #[tokio::test]
    async fn test_get_bytes() {
        let mut server = Server::new_async().await;
        let _ok = server
            .mock("GET", "/img.jpg")
            .with_status(200)
            .with_body([1u8, 2, 3])
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/gone.jpg")
            .with_status(404)
            .create_async()
            .await;

        let client = create_client(&server);
        let bytes = client
            .get_bytes(&format!("{}/img.jpg", server.url()))
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);

        let result = client.get_bytes(&format!("{}/gone.jpg", server.url())).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[test]
    fn test_display() {
        let config = RestApiConfig {
            base_url: "https://api.example.com/".to_string(),
            timeout: 5,
            user_agent: "agent".to_string(),
            app_id: "1".to_string(),
        };
        let client = PlatformHttpClient::new(&config).unwrap();
        assert_eq!(client.to_string(), r#"{"base_url":"https://api.example.com"}"#);
    }
}
