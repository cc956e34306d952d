//! IAM authentication for the registry API
//!
//! Exchanges an API key for a bearer token at the IBM Cloud IAM token
//! endpoint and caches it for the lifetime of the invocation.

use crate::registry::{BackendError, BackendResult};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

const IAM_TOKEN_ENDPOINT: &str = "https://iam.cloud.ibm.com/identity/token";
const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    // Part of the response; invocations are short enough that expiry
    // handling is not needed.
    #[allow(dead_code)]
    expires_in: Option<u64>,
}

#[derive(Debug)]
pub struct IamAuthenticator {
    client: Client,
    apikey: String,
    token: Mutex<Option<String>>,
}

impl IamAuthenticator {
    pub fn new(client: Client, apikey: String) -> Self {
        Self {
            client,
            apikey,
            token: Mutex::new(None),
        }
    }

    /// Bearer token for the configured API key, fetching it on first use.
    pub async fn token(&self) -> BackendResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let response = self
            .client
            .post(IAM_TOKEN_ENDPOINT)
            .form(&[
                ("grant_type", APIKEY_GRANT_TYPE),
                ("apikey", self.apikey.as_str()),
            ])
            .send()
            .await
            .map_err(|e| BackendError::Transport(format!("IAM token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Auth(format!(
                "IAM rejected the API key (status {}): {}",
                status, body
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Transport(format!("invalid IAM token response: {}", e)))?;
        *cached = Some(parsed.access_token.clone());
        Ok(parsed.access_token)
    }
}
