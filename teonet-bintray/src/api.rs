//! Bintray REST client.
//!
//! Every request carries HTTP Basic credentials built once from the
//! configuration. Connection pooling is disabled: each call opens its own
//! connection and response bodies are consumed before returning.

use crate::config::BintrayConfig;
use crate::error::PublishError;
use base64::prelude::*;
use chrono::{DateTime, Utc};
use hyper::ext::ReasonPhrase;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};

/// Outcome of a version creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStatus {
    Created,
    AlreadyExists,
}

/// Outcome of a file upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Uploaded,
    /// The file already exists remotely (HTTP 409).
    Conflict,
}

/// A file entry as listed by the package files endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteFile {
    pub name: String,
    pub path: String,
    pub repo: String,
    pub package: String,
    pub version: String,
    pub owner: String,
    pub created: Option<DateTime<Utc>>,
    pub size: u64,
    pub sha1: Option<String>,
}

impl RemoteFile {
    /// File name, derived from the path when the listing omits it.
    pub fn file_name(&self) -> &str {
        if self.name.is_empty() {
            self.path.rsplit('/').next().unwrap_or_default()
        } else {
            &self.name
        }
    }
}

#[derive(Serialize)]
struct NewVersion<'a> {
    name: &'a str,
    desc: &'a str,
}

/// Authenticated client for the Bintray REST API.
#[derive(Debug, Clone)]
pub struct BintrayClient {
    http: Client,
    api_url: String,
    org: String,
}

impl BintrayClient {
    /// Creates a client. Fails with `MissingCredentials` before any network use.
    pub fn new(config: &BintrayConfig) -> Result<Self, PublishError> {
        let (user, pass) = config.credentials()?;

        let token = BASE64_STANDARD.encode(format!("{}:{}", user, pass));
        let mut auth = HeaderValue::from_str(&format!("Basic {}", token))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(0)
            .user_agent(concat!("teonet-bintray/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            org: config.org().to_string(),
        })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    /// Absolute URL for an API path (`/packages/...`, `/content/...`).
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_url, path)
        } else {
            format!("{}/{}", self.api_url, path)
        }
    }

    /// Content URL of a stored file, each path segment percent-encoded.
    pub fn content_url(&self, repo: &str, path: &str) -> Result<Url, PublishError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| PublishError::InvalidUrl(format!("{}: {}", self.api_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| PublishError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(["content", self.org.as_str(), repo])
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    /// Creates a package version. An existing version is not an error.
    pub async fn create_version(
        &self,
        repo: &str,
        package: &str,
        version: &str,
        desc: &str,
    ) -> Result<VersionStatus, PublishError> {
        let url = self.url(&format!("/packages/{}/{}/{}/versions", self.org, repo, package));
        tracing::debug!("POST {} name={}", url, version);

        let response = self
            .http
            .post(&url)
            .json(&NewVersion {
                name: version,
                desc,
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                consume(response).await?;
                Ok(VersionStatus::Created)
            }
            StatusCode::CONFLICT => {
                consume(response).await?;
                Ok(VersionStatus::AlreadyExists)
            }
            _ => Err(http_error(url, response).await),
        }
    }

    /// Uploads file content to `path` (relative to the API base, matrix
    /// parameters included).
    pub async fn upload_file(&self, path: &str, data: Vec<u8>) -> Result<UploadStatus, PublishError> {
        let url = self.url(path);
        tracing::debug!("PUT {} ({} bytes)", url, data.len());

        let response = self
            .http
            .put(&url)
            .header(CONTENT_TYPE, "application/binary")
            .body(data)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                consume(response).await?;
                Ok(UploadStatus::Uploaded)
            }
            StatusCode::CONFLICT => {
                consume(response).await?;
                Ok(UploadStatus::Conflict)
            }
            _ => Err(http_error(url, response).await),
        }
    }

    /// Lists the files of a package.
    pub async fn list_files(
        &self,
        repo: &str,
        package: &str,
        include_unpublished: bool,
    ) -> Result<Vec<RemoteFile>, PublishError> {
        let url = self.url(&format!(
            "/packages/{}/{}/{}/files?include_unpublished={}",
            self.org,
            repo,
            package,
            u8::from(include_unpublished)
        ));
        tracing::debug!("GET {}", url);

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(http_error(url, response).await);
        }
        Ok(response.json().await?)
    }

    /// Returns the package description, including its version list.
    pub async fn package_info(
        &self,
        repo: &str,
        package: &str,
    ) -> Result<serde_json::Value, PublishError> {
        let url = self.url(&format!("/packages/{}/{}/{}", self.org, repo, package));
        tracing::debug!("GET {}", url);

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(http_error(url, response).await);
        }
        Ok(response.json().await?)
    }

    /// Deletes a stored file.
    pub async fn delete_file(&self, repo: &str, path: &str) -> Result<(), PublishError> {
        let url = self.content_url(repo, path)?;
        tracing::debug!("DELETE {}", url);

        let response = self.http.delete(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(http_error(url.to_string(), response).await);
        }
        consume(response).await
    }
}

async fn consume(response: Response) -> Result<(), PublishError> {
    response.bytes().await?;
    Ok(())
}

async fn http_error(url: String, response: Response) -> PublishError {
    let status = response.status();
    let reason = reason_phrase(&response);
    match response.text().await {
        Ok(body) if !body.is_empty() => tracing::debug!("HTTP {} body: {}", status.as_u16(), body),
        Ok(_) => {}
        Err(e) => tracing::debug!("Failed to read error body: {}", e),
    }

    PublishError::Http {
        url,
        status: status.as_u16(),
        reason,
    }
}

/// Reason phrase sent by the server, or the canonical one for the status.
fn reason_phrase(response: &Response) -> String {
    match response.extensions().get::<ReasonPhrase>() {
        Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string(),
    }
}
