//! Concrete registry client for IBM Cloud Container Registry
//!
//! Management operations (namespaces, image delete, tags, scan reports) go
//! over the regional registry REST API. Image transfer (push/pull/local
//! tagging) delegates to the local `docker` CLI with an ephemeral
//! `DOCKER_CONFIG` carrying the registry credentials, so the Docker v2 wire
//! protocol stays outside this crate.

use crate::error::{Error, Result};
use crate::logging::Logger;
use crate::registry::auth::IamAuthenticator;
use crate::registry::{BackendError, BackendResult, RegistryBackend};
use crate::scan::{ScanReport, ScanStatus};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

pub struct IcrClientBuilder {
    registry_host: String,
    apikey: String,
    timeout: u64,
    skip_tls: bool,
    logger: Logger,
}

impl IcrClientBuilder {
    pub fn new(registry_host: String, apikey: String, logger: Logger) -> Self {
        Self {
            registry_host,
            apikey,
            timeout: 300,
            skip_tls: false,
            logger,
        }
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    pub fn build(self) -> Result<IcrClient> {
        let mut builder = Client::builder().timeout(Duration::from_secs(self.timeout));
        if self.skip_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        let auth = IamAuthenticator::new(client.clone(), self.apikey.clone());
        Ok(IcrClient {
            client,
            base_url: format!("https://{}", self.registry_host),
            registry_host: self.registry_host,
            apikey: self.apikey,
            auth,
            logger: self.logger,
        })
    }
}

pub struct IcrClient {
    client: Client,
    base_url: String,
    registry_host: String,
    apikey: String,
    auth: IamAuthenticator,
    logger: Logger,
}

impl IcrClient {
    async fn api_request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> BackendResult<reqwest::Response> {
        let token = self.auth.token().await?;
        let url = format!("{}{}", self.base_url, path);
        self.logger.debug(&format!("{} {}", method, url));

        let mut request = self.client.request(method, &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        check_status(response).await
    }

    async fn docker(&self, args: &[&str], authed: bool) -> BackendResult<String> {
        let mut command = Command::new("docker");
        // Guard lives until the docker process has exited, then scrubs the
        // credential from disk
        let _config = if authed {
            let config = DockerConfig::write(&self.registry_host, &self.apikey)?;
            command.arg("--config").arg(config.dir());
            Some(config)
        } else {
            None
        };
        command.args(args);
        self.logger.step(&format!("docker {}", args.join(" ")));

        let output = command
            .output()
            .await
            .map_err(|e| BackendError::Transport(format!("failed to run docker: {}", e)))?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let lowered = stderr.to_lowercase();
        if lowered.contains("unauthorized") || lowered.contains("denied") {
            Err(BackendError::Auth(stderr))
        } else if lowered.contains("not found") || lowered.contains("manifest unknown") {
            Err(BackendError::NotFound(stderr))
        } else {
            Err(BackendError::Transport(stderr))
        }
    }
}

/// Ephemeral docker config directory holding credentials for one registry
/// host, so docker invocations never touch the user's config. The directory
/// is owner-only and removed again on drop; credentials must not outlive
/// the invocation.
struct DockerConfig {
    dir: PathBuf,
}

impl DockerConfig {
    fn write(registry_host: &str, apikey: &str) -> BackendResult<Self> {
        let dir = std::env::temp_dir().join(format!("cr-manager-{}", std::process::id()));
        let transport =
            |e: std::io::Error| BackendError::Transport(format!("failed to write docker config: {}", e));

        std::fs::create_dir_all(&dir).map_err(transport)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))
                .map_err(transport)?;
        }

        let auth_entry = Base64.encode(format!("iamapikey:{}", apikey));
        let config = json!({
            "auths": { registry_host: { "auth": auth_entry } }
        });
        let path = dir.join("config.json");
        std::fs::write(&path, config.to_string()).map_err(transport)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .map_err(transport)?;
        }
        Ok(Self { dir })
    }

    fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

impl Drop for DockerConfig {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

async fn check_status(response: reqwest::Response) -> BackendResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BackendError::Auth(message)),
        StatusCode::NOT_FOUND => Err(BackendError::NotFound(message)),
        StatusCode::CONFLICT => Err(BackendError::AlreadyExists(message)),
        _ => Err(BackendError::Api {
            status: status.as_u16(),
            message,
        }),
    }
}

/// Pull the `sha256:...` digest out of docker push/pull output.
fn parse_digest(output: &str) -> Option<String> {
    output.split_whitespace().collect::<Vec<_>>().windows(2).find_map(|pair| {
        if pair[0].eq_ignore_ascii_case("digest:") && pair[1].starts_with("sha256:") {
            Some(pair[1].to_string())
        } else {
            None
        }
    })
}

#[async_trait]
impl RegistryBackend for IcrClient {
    async fn push(&self, image: &str) -> BackendResult<Option<String>> {
        let output = self.docker(&["push", image], true).await?;
        Ok(parse_digest(&output))
    }

    async fn pull(&self, image: &str) -> BackendResult<Option<String>> {
        let output = self.docker(&["pull", image], true).await?;
        Ok(parse_digest(&output))
    }

    async fn tag_local(&self, local: &str, image: &str) -> BackendResult<()> {
        self.docker(&["tag", local, image], false).await?;
        Ok(())
    }

    async fn tag(&self, image: &str, new_tag: &str) -> BackendResult<()> {
        self.api_request(
            reqwest::Method::POST,
            "/api/v1/images/tags",
            Some(json!({ "image": image, "tag": new_tag })),
        )
        .await?;
        Ok(())
    }

    async fn retag(&self, image: &str, source_tag: &str, target_tag: &str) -> BackendResult<()> {
        self.api_request(
            reqwest::Method::POST,
            "/api/v1/images/tags",
            Some(json!({
                "image": image,
                "source_tag": source_tag,
                "target_tag": target_tag,
            })),
        )
        .await?;
        Ok(())
    }

    async fn delete_image(&self, image: &str) -> BackendResult<()> {
        let path = format!("/api/v1/images/{}", urlencode(image));
        self.api_request(reqwest::Method::DELETE, &path, None).await?;
        Ok(())
    }

    async fn create_namespace(&self, name: &str) -> BackendResult<()> {
        let path = format!("/api/v1/namespaces/{}", urlencode(name));
        self.api_request(reqwest::Method::PUT, &path, None).await?;
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> BackendResult<()> {
        let path = format!("/api/v1/namespaces/{}", urlencode(name));
        self.api_request(reqwest::Method::DELETE, &path, None).await?;
        Ok(())
    }

    async fn list_namespaces(&self) -> BackendResult<Vec<String>> {
        let response = self
            .api_request(reqwest::Method::GET, "/api/v1/namespaces", None)
            .await?;
        response
            .json::<Vec<String>>()
            .await
            .map_err(|e| BackendError::Transport(format!("invalid namespace list: {}", e)))
    }

    async fn initiate_scan(&self, image: &str) -> BackendResult<()> {
        let path = format!("/va/api/v3/scan/{}", urlencode(image));
        self.api_request(reqwest::Method::POST, &path, None).await?;
        Ok(())
    }

    async fn query_scan(&self, image: &str) -> BackendResult<ScanReport> {
        let path = format!("/va/api/v3/report/image/{}", urlencode(image));
        let response = self.api_request(reqwest::Method::GET, &path, None).await?;
        let detail: Value = response
            .json()
            .await
            .map_err(|e| BackendError::Transport(format!("invalid scan report: {}", e)))?;

        let status: ScanStatus = detail
            .get("status")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| BackendError::Api {
                status: 200,
                message: format!("unexpected scan status in report: {}", e),
            })?
            .unwrap_or(ScanStatus::Unscanned);
        Ok(ScanReport { status, detail })
    }
}

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
