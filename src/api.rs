use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::Poem;
use crate::routes::encode_component;

/// The public PoetryDB instance.
pub const DEFAULT_BASE_URL: &str = "https://poetrydb.org";

/// Upstream has no SLA; without a bound a hung request would pin the
/// loading state forever.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// What went wrong talking to the poetry service.
///
/// The distinctions exist for logs and tests; the UI collapses all of them
/// into [`ApiError::user_message`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),

    #[error("malformed response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    /// The one message users see, regardless of the underlying failure.
    pub fn user_message(&self) -> &'static str {
        "Something went wrong with the search. Please try again."
    }
}

/// Read-only client for the PoetryDB HTTP API.
#[derive(Debug, Clone)]
pub struct PoetryDb {
    http: Client,
    base: String,
}

impl PoetryDb {
    pub fn new(base: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("versewalk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// `GET /author` — every author name the service knows.
    pub async fn authors(&self) -> Result<Vec<String>, ApiError> {
        #[derive(Deserialize)]
        struct Envelope {
            authors: Vec<String>,
        }

        let value = self.get_json("/author").await?;
        let envelope: Envelope = serde_json::from_value(value).map_err(ApiError::Decode)?;
        Ok(envelope.authors)
    }

    /// `GET /author/{name}` — all poems by an exactly-named author.
    pub async fn poems_by_author(&self, name: &str) -> Result<Vec<Poem>, ApiError> {
        let path = format!("/author/{}", encode_component(name));
        self.poem_list(&path).await
    }

    /// `GET /author/{query}:abs` — poems whose author name contains `query`.
    pub async fn search_authors(&self, query: &str) -> Result<Vec<Poem>, ApiError> {
        let path = format!("/author/{}:abs", encode_component(query));
        self.poem_list(&path).await
    }

    /// `GET /author,title/{author};{title}` — exact lookup of one poem.
    pub async fn poem(&self, author: &str, title: &str) -> Result<Option<Poem>, ApiError> {
        let path = format!(
            "/author,title/{};{}",
            encode_component(author),
            encode_component(title)
        );
        Ok(self.poem_list(&path).await?.into_iter().next())
    }

    /// `GET /title/{query}:abs` — poems whose title contains `query`.
    pub async fn search_titles(&self, query: &str) -> Result<Vec<Poem>, ApiError> {
        let path = format!("/title/{}:abs", encode_component(query));
        self.poem_list(&path).await
    }

    /// Title search projected to `author,title`, for the preview list.
    pub async fn title_preview(&self, query: &str) -> Result<Vec<Poem>, ApiError> {
        let path = format!("/title/{}:abs/author,title", encode_component(query));
        self.poem_list(&path).await
    }

    /// `GET /lines/{query}:abs` — poems whose lines contain `query`.
    pub async fn search_lines(&self, query: &str) -> Result<Vec<Poem>, ApiError> {
        let path = format!("/lines/{}:abs", encode_component(query));
        self.poem_list(&path).await
    }

    /// Line search projected to `author,title,lines`, for the preview list.
    pub async fn lines_preview(&self, query: &str) -> Result<Vec<Poem>, ApiError> {
        let path = format!("/lines/{}:abs/author,title,lines", encode_component(query));
        self.poem_list(&path).await
    }

    /// `GET /random` — one randomly selected poem.
    pub async fn random(&self) -> Result<Option<Poem>, ApiError> {
        Ok(self.poem_list("/random").await?.into_iter().next())
    }

    async fn poem_list(&self, path: &str) -> Result<Vec<Poem>, ApiError> {
        let value = self.get_json(path).await?;
        match value {
            Value::Array(_) => serde_json::from_value(value).map_err(ApiError::Decode),
            // PoetryDB reports "no match" as `{"status": 404, "reason": ...}`
            // with HTTP 200. Any non-array body is that convention, not a
            // failure.
            other => {
                debug!(body = %other, "treating non-array payload as empty result set");
                Ok(Vec::new())
            }
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base, path);
        debug!(%url, "poetrydb request");
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "poetrydb request rejected");
            return Err(ApiError::Status(status));
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(ApiError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let client = PoetryDb::new("http://localhost:8080///").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn user_message_is_uniform() {
        let status = ApiError::Status(StatusCode::INTERNAL_SERVER_ERROR);
        let decode =
            ApiError::Decode(serde_json::from_str::<Value>("not json").unwrap_err());
        assert_eq!(status.user_message(), decode.user_message());
    }
}
