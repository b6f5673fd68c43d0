use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::{multipart, Client};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::hash;
use crate::store::ContentStore;

/// How long a freshly issued token stays valid.
const TOKEN_TTL: Duration = Duration::from_secs(3600);

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A bearer token with an explicit expiry.
///
/// The CLI caches this between runs and re-authenticates once it has
/// expired, instead of hiding the token inside an opaque cache layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: String) -> Self {
        Self {
            token,
            expires_at: Utc::now() + TOKEN_TTL,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[derive(Deserialize)]
struct AuthResponse {
    #[serde(rename = "authToken")]
    auth_token: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    uuid: Option<String>,
}

/// HTTP client for an elasticms-style document repository.
pub struct EmsClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl EmsClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn token(&self) -> Result<&str> {
        self.token.as_deref().ok_or(Error::NotAuthenticated)
    }

    /// Authenticate and start a fresh session. The token is retained on
    /// the client for all subsequent calls.
    pub fn login(&mut self, username: &str, password: &str) -> Result<Session> {
        let url = self.url("/auth-token");
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::AuthRejected(username.to_string()));
        }
        if !response.status().is_success() {
            return Err(Error::UnexpectedStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let auth: AuthResponse = response.json()?;
        let session = Session::new(auth.auth_token);
        self.token = Some(session.token.clone());
        Ok(session)
    }

    /// Reuse a previously issued (unexpired) token.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }
}

impl ContentStore for EmsClient {
    fn hash_file(&self, path: &Path) -> Result<String> {
        Ok(hash::sha256_file(path)?)
    }

    fn head_file(&self, path: &Path) -> Result<bool> {
        let hash = self.hash_file(path)?;
        let url = self.url(&format!("/api/file/{hash}"));
        let response = self
            .http
            .head(&url)
            .bearer_auth(self.token()?)
            .send()?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Error::UnexpectedStatus {
                url,
                status: status.as_u16(),
            }),
        }
    }

    fn upload_file(&self, path: &Path, display_name: &str) -> Result<Option<String>> {
        let url = self.url("/api/file");
        let form = multipart::Form::new()
            .text("name", display_name.to_string())
            .file("file", path)?;
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.token()?)
            .multipart(form)
            .send()?;

        if !response.status().is_success() {
            return Err(Error::UnexpectedStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let upload: UploadResponse = response.json()?;
        debug!(path = %path.display(), uuid = ?upload.uuid, "uploaded file");
        Ok(upload.uuid)
    }

    fn save_document(&self, content_type: &str, ouuid: &str, document: &Value) -> Result<()> {
        let url = self.url(&format!("/api/data/{content_type}/index/{ouuid}"));
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.token()?)
            .json(document)
            .send()?;

        if !response.status().is_success() {
            return Err(Error::UnexpectedStatus {
                url,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
