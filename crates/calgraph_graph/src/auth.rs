// --- File: crates/calgraph_graph/src/auth.rs ---
//! Device-code sign-in against the Microsoft identity platform.
//!
//! The credential caches the access token in memory and renews it with the
//! refresh token when it is about to expire. A new device-code sign-in is only
//! started when no usable token is left.

use calgraph_config::AppConfig;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Tokens expiring within this margin are treated as already expired.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const SLOW_DOWN_INCREMENT_SECS: u64 = 5;
/// Upper bound for server-reported lifetimes of tokens and device codes.
const MAX_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// `now + secs`, capped at [`MAX_LIFETIME`].
pub(crate) fn expires_after(now: Instant, secs: u64) -> Instant {
    now + Duration::from_secs(secs).min(MAX_LIFETIME)
}

/// Errors that can occur while acquiring a token.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP request to the identity platform failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Failed to encode form body: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
    #[error("Device code request rejected (status {status}): {body}")]
    DeviceCodeRejected { status: u16, body: String },
    #[error("Device code expired before sign-in completed")]
    Expired,
    #[error("Sign-in was declined")]
    Declined,
    #[error("Token request failed: {error} - {description}")]
    TokenRejected { error: String, description: String },
}

/// What the authority hands out at the start of a device-code sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCodeInfo {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_in: u64,
    pub interval: Option<u64>,
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
    refresh_token: Option<String>,
}

impl CachedToken {
    fn from_response(response: TokenResponse, previous_refresh: Option<&str>) -> Self {
        Self {
            access_token: response.access_token,
            expires_at: expires_after(Instant::now(), response.expires_in),
            // Refresh tokens may rotate; keep the old one if none came back.
            refresh_token: response
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at > now + EXPIRY_MARGIN
    }
}

/// Reaction to an error answer while polling the token endpoint.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PollAction {
    Retry { interval_secs: u64 },
    Declined,
    Expired,
    Fail,
}

pub(crate) fn next_poll_action(error: &str, interval_secs: u64) -> PollAction {
    match error {
        "authorization_pending" => PollAction::Retry { interval_secs },
        "slow_down" => PollAction::Retry {
            interval_secs: interval_secs + SLOW_DOWN_INCREMENT_SECS,
        },
        "authorization_declined" | "access_denied" => PollAction::Declined,
        "expired_token" | "code_expired" => PollAction::Expired,
        _ => PollAction::Fail,
    }
}

/// Called once per device-code sign-in to show the user where to go.
pub type DevicePrompt = Box<dyn Fn(&DeviceCodeInfo) + Send + Sync>;

fn print_device_prompt(info: &DeviceCodeInfo) {
    match &info.message {
        Some(message) => println!("{}", message),
        None => println!(
            "To sign in, open {} and enter the code {}",
            info.verification_uri, info.user_code
        ),
    }
}

/// Public-client credential using the OAuth device authorization grant.
pub struct DeviceCodeCredential {
    http: Client,
    authority: String,
    tenant_id: String,
    client_id: String,
    scopes: Vec<String>,
    prompt: DevicePrompt,
    cache: Mutex<Option<CachedToken>>,
}

impl DeviceCodeCredential {
    pub fn new(
        http: Client,
        authority: &str,
        tenant_id: &str,
        client_id: &str,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            http,
            authority: authority.trim_end_matches('/').to_string(),
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            scopes,
            prompt: Box::new(print_device_prompt),
            cache: Mutex::new(None),
        }
    }

    pub fn from_config(http: Client, config: &AppConfig) -> Self {
        Self::new(
            http,
            &config.graph.authority,
            &config.azure.tenant_id,
            &config.azure.client_id,
            config.azure.scopes(),
        )
    }

    /// Replaces the default stdout prompt.
    pub fn with_prompt<F>(mut self, prompt: F) -> Self
    where
        F: Fn(&DeviceCodeInfo) + Send + Sync + 'static,
    {
        self.prompt = Box::new(prompt);
        self
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}/oauth2/v2.0/{}", self.authority, self.tenant_id, name)
    }

    fn scope(&self) -> String {
        self.scopes.join(" ")
    }

    /// Returns a valid access token, signing in or refreshing as needed.
    ///
    /// The cache lock is held for the whole acquisition, so concurrent callers
    /// wait for one sign-in instead of starting several.
    pub async fn token(&self) -> Result<String, AuthError> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(Instant::now()) {
                return Ok(cached.access_token.clone());
            }
        }

        let refresh_token = cache.as_ref().and_then(|c| c.refresh_token.clone());
        if let Some(refresh_token) = refresh_token {
            match self.refresh(&refresh_token).await {
                Ok(token) => {
                    debug!("access token refreshed");
                    let access_token = token.access_token.clone();
                    *cache = Some(token);
                    return Ok(access_token);
                }
                Err(e) => warn!("Token refresh failed, starting device code sign-in: {}", e),
            }
        }

        let token = self.device_code_flow().await?;
        let access_token = token.access_token.clone();
        *cache = Some(token);
        Ok(access_token)
    }

    async fn post_form<T: Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
    ) -> Result<reqwest::Response, AuthError> {
        let body = serde_urlencoded::to_string(form)?;
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;
        Ok(response)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<CachedToken, AuthError> {
        let scope = self.scope();
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("scope", scope.as_str()),
        ];
        let response = self.post_form(&self.endpoint("token"), &form).await?;
        if response.status().is_success() {
            let token: TokenResponse = response.json().await?;
            return Ok(CachedToken::from_response(token, Some(refresh_token)));
        }
        let err = read_token_error(response).await;
        Err(AuthError::TokenRejected {
            error: err.error,
            description: err.error_description.unwrap_or_default(),
        })
    }

    async fn request_device_code(&self) -> Result<DeviceCodeInfo, AuthError> {
        let scope = self.scope();
        let form = [("client_id", self.client_id.as_str()), ("scope", scope.as_str())];
        let response = self.post_form(&self.endpoint("devicecode"), &form).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::DeviceCodeRejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    async fn device_code_flow(&self) -> Result<CachedToken, AuthError> {
        let info = self.request_device_code().await?;
        (self.prompt)(&info);
        info!("Waiting for device code sign-in (code expires in {}s)", info.expires_in);

        let deadline = expires_after(Instant::now(), info.expires_in);
        let mut interval_secs = info.interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        let form = [
            ("grant_type", DEVICE_CODE_GRANT),
            ("client_id", self.client_id.as_str()),
            ("device_code", info.device_code.as_str()),
        ];

        loop {
            tokio::time::sleep(Duration::from_secs(interval_secs)).await;
            if Instant::now() >= deadline {
                return Err(AuthError::Expired);
            }

            let response = self.post_form(&self.endpoint("token"), &form).await?;
            if response.status().is_success() {
                let token: TokenResponse = response.json().await?;
                info!("Device code sign-in completed");
                return Ok(CachedToken::from_response(token, None));
            }

            let err = read_token_error(response).await;
            match next_poll_action(&err.error, interval_secs) {
                PollAction::Retry { interval_secs: next } => {
                    debug!("token not issued yet ({}), polling again in {}s", err.error, next);
                    interval_secs = next;
                }
                PollAction::Declined => return Err(AuthError::Declined),
                PollAction::Expired => return Err(AuthError::Expired),
                PollAction::Fail => {
                    return Err(AuthError::TokenRejected {
                        error: err.error,
                        description: err.error_description.unwrap_or_default(),
                    })
                }
            }
        }
    }
}

async fn read_token_error(response: reqwest::Response) -> TokenErrorResponse {
    let status = response.status();
    response.json().await.unwrap_or_else(|_| TokenErrorResponse {
        error: format!("http_{}", status.as_u16()),
        error_description: None,
    })
}
