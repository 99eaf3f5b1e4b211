use crate::constants::{
    DEFAULT_APP_ID, DEFAULT_BASE_URL, DEFAULT_COOKIE_PATH, DEFAULT_ENGAGER_LIMIT,
    DEFAULT_SESSION_TTL_DAYS, DEFAULT_USER_AGENT,
};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fmt::Debug;
use std::str::FromStr;
use tracing::error;

#[derive(Debug, Deserialize, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub rest_api: RestApiConfig,
    pub session: SessionConfig,
    pub analysis: AnalysisConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RestApiConfig {
    pub base_url: String,
    pub timeout: u64,
    pub user_agent: String,
    pub app_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub cookie_path: String,
    pub ttl_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    pub engager_limit: usize,
    /// Milliseconds to wait between engagers; 0 disables the pause.
    pub request_pause_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub output_dir: String,
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"username\":\"{}\",\"password\":\"[REDACTED]\"}}",
            self.username
        )
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"credentials\":{},\"rest_api\":{},\"session\":{},\"analysis\":{},\"storage\":{}}}",
            self.credentials, self.rest_api, self.session, self.analysis, self.storage
        )
    }
}

impl fmt::Display for RestApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"base_url\":\"{}\",\"timeout\":{},\"user_agent\":\"{}\",\"app_id\":\"{}\"}}",
            self.base_url, self.timeout, self.user_agent, self.app_id
        )
    }
}

impl fmt::Display for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"cookie_path\":\"{}\",\"ttl_days\":{}}}",
            self.cookie_path, self.ttl_days
        )
    }
}

impl fmt::Display for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"engager_limit\":{},\"request_pause_ms\":{}}}",
            self.engager_limit, self.request_pause_ms
        )
    }
}

impl fmt::Display for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"output_dir\":\"{}\"}}", self.output_dir)
    }
}

pub fn get_env_or_default<T: FromStr>(env_var: &str, default: T) -> T
where
    <T as FromStr>::Err: Debug,
{
    match env::var(env_var) {
        Ok(val) => val.parse::<T>().unwrap_or_else(|_| {
            error!("Failed to parse {}: {}, using default", env_var, val);
            default
        }),
        Err(_) => default,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Config {
            credentials: Credentials {
                username: get_env_or_default("INSTA_USERNAME", String::from("default_username")),
                password: get_env_or_default("INSTA_PASSWORD", String::from("default_password")),
            },
            rest_api: RestApiConfig {
                base_url: get_env_or_default("INSTA_REST_BASE_URL", String::from(DEFAULT_BASE_URL)),
                timeout: get_env_or_default("INSTA_REST_TIMEOUT", 30),
                user_agent: get_env_or_default(
                    "INSTA_USER_AGENT",
                    String::from(DEFAULT_USER_AGENT),
                ),
                app_id: get_env_or_default("INSTA_APP_ID", String::from(DEFAULT_APP_ID)),
            },
            session: SessionConfig {
                cookie_path: get_env_or_default(
                    "INSTA_COOKIE_PATH",
                    String::from(DEFAULT_COOKIE_PATH),
                ),
                ttl_days: get_env_or_default("INSTA_SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS),
            },
            analysis: AnalysisConfig {
                engager_limit: get_env_or_default("INSTA_ENGAGER_LIMIT", DEFAULT_ENGAGER_LIMIT),
                request_pause_ms: get_env_or_default("INSTA_REQUEST_PAUSE_MS", 0),
            },
            storage: StorageConfig {
                output_dir: get_env_or_default("INSTA_OUTPUT_DIR", String::from(".")),
            },
        }
    }
}
