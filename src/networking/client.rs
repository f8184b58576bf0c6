//! HTTP client for the rendering service
//!
//! `Collaborator` is the seam between the picker and the service; the
//! reqwest-backed `HttpCollaborator` is the production implementation.

use super::{NetworkError, NetworkResult};
use crate::catalog::{Actor, ActorDetail, ColourCatalog};
use crate::config::ServerSettings;
use crate::utils::encode_component;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Every call the picker makes against the rendering service
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// `GET /v1/`
    async fn fetch_catalog(&self) -> NetworkResult<Vec<Actor>>;

    /// `GET /v1/{slug}`
    async fn fetch_actor_detail(&self, slug: &str) -> NetworkResult<ActorDetail>;

    /// `GET /v1/{slug}/colours`
    async fn fetch_colour_sets(&self, slug: &str) -> NetworkResult<ColourCatalog>;

    /// `GET` a composed render path such as `/v1/follower/Fox?animation=idle`
    async fn fetch_render(&self, path_and_query: &str) -> NetworkResult<Bytes>;

    /// `POST /login`
    async fn login(&self, password: &str) -> NetworkResult<()>;

    /// `POST /logout`
    async fn logout(&self) -> NetworkResult<()>;
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    actors: Vec<Actor>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// reqwest-backed collaborator
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    http_client: HttpClient,
    base_url: Url,
}

impl HttpCollaborator {
    pub fn new(settings: &ServerSettings) -> NetworkResult<Self> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| NetworkError::Transport { reason: format!("invalid base_url {:?}: {}", settings.base_url, e) })?;

        let http_client = HttpClient::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_millis(settings.timeout_ms))
            .cookie_store(true)
            .build()?;

        info!("🌐 Rendering service client for {}", base_url);

        Ok(Self { http_client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a service-relative path (leading `/` allowed) against the base URL
    pub fn url_for(&self, path_and_query: &str) -> NetworkResult<Url> {
        self.base_url
            .join(path_and_query.trim_start_matches('/'))
            .map_err(|e| NetworkError::Transport { reason: format!("invalid path {:?}: {}", path_and_query, e) })
    }

    async fn get(&self, path: &str) -> NetworkResult<Response> {
        let url = self.url_for(path)?;
        debug!("🌐 GET {}", url);
        let request_start = std::time::Instant::now();
        let response = self.http_client.get(url).send().await?;
        debug!("🌐 GET {} -> {} in {:?}", path, response.status(), request_start.elapsed());
        check_status(response).await
    }

    async fn get_json(&self, path: &str) -> NetworkResult<serde_json::Value> {
        let response = self.get(path).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Map non-success statuses onto the error taxonomy
async fn check_status(response: Response) -> NetworkResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let path = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    let error = status_error(status, body);
    warn!("❌ {} answered: {}", path, error);
    Err(error)
}

/// Error for a failed data call; 401 means the session is gone
fn status_error(status: StatusCode, body: String) -> NetworkError {
    if status == StatusCode::UNAUTHORIZED {
        return NetworkError::Unauthorized;
    }
    NetworkError::HttpStatus { status: status.as_u16(), body }
}

/// Error for a failed `/login`; a 401 carries the server's message
fn login_error(status: StatusCode, body: String) -> NetworkError {
    if status == StatusCode::UNAUTHORIZED {
        return NetworkError::LoginRejected { message: rejection_message(body) };
    }
    NetworkError::HttpStatus { status: status.as_u16(), body }
}

/// `{"error": ..}` when the body has one, else the raw body
fn rejection_message(body: String) -> String {
    serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body)
}

/// Actors without colour data answer with a bare empty array
fn decode_colours(value: serde_json::Value) -> NetworkResult<ColourCatalog> {
    match value {
        serde_json::Value::Array(items) if items.is_empty() => Ok(ColourCatalog::default()),
        serde_json::Value::Null => Ok(ColourCatalog::default()),
        other => Ok(serde_json::from_value(other)?),
    }
}

#[async_trait]
impl Collaborator for HttpCollaborator {
    async fn fetch_catalog(&self) -> NetworkResult<Vec<Actor>> {
        let value = self.get_json("/v1/").await?;
        let catalog: CatalogResponse = serde_json::from_value(value)?;
        info!("📚 Fetched catalog: {} actors", catalog.actors.len());
        Ok(catalog.actors)
    }

    async fn fetch_actor_detail(&self, slug: &str) -> NetworkResult<ActorDetail> {
        let value = self.get_json(&format!("/v1/{}", encode_component(slug))).await?;
        let detail: ActorDetail = serde_json::from_value(value)?;
        info!("🎭 Fetched {}: {} skins, {} animations", slug, detail.skins.len(), detail.animations.len());
        Ok(detail)
    }

    async fn fetch_colour_sets(&self, slug: &str) -> NetworkResult<ColourCatalog> {
        let value = self.get_json(&format!("/v1/{}/colours", encode_component(slug))).await?;
        let colours = decode_colours(value)?;
        info!("🎨 Fetched colours for {}: {} global, {} skin groups", slug, colours.global.len(), colours.skins.len());
        Ok(colours)
    }

    async fn fetch_render(&self, path_and_query: &str) -> NetworkResult<Bytes> {
        let response = self.get(path_and_query).await?;
        let data = response.bytes().await?;
        info!("🖼️ Downloaded render: {} bytes", data.len());
        Ok(data)
    }

    async fn login(&self, password: &str) -> NetworkResult<()> {
        let url = self.url_for("/login")?;
        info!("🔄 LOGIN: Submitting credentials");
        let response = self.http_client
            .post(url)
            .json(&json!({ "password": password }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("✅ LOGIN SUCCESS");
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        let error = login_error(status, text);
        warn!("❌ LOGIN FAILED: {}", error);
        Err(error)
    }

    async fn logout(&self) -> NetworkResult<()> {
        let url = self.url_for("/logout")?;
        let response = self.http_client.post(url).send().await?;
        check_status(response).await?;
        info!("👋 Logged out");
        Ok(())
    }
}
