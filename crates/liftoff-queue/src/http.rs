//! HTTP client for the queue and index services
//!
//! Requests go through the worker's local proxy, which attaches
//! credentials, so no authentication happens here.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{QueueError, Result};
use crate::traits::QueueService;
use crate::types::IndexedTask;

/// Endpoints and timeout for [`HttpQueue`]
#[derive(Debug, Clone)]
pub struct HttpQueueConfig {
    /// Queue service base URL (e.g. `http://taskcluster/queue/v1`)
    pub queue_url: String,

    /// Index service base URL (e.g. `http://taskcluster/index/v1`)
    pub index_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

/// Queue client speaking the REST API
pub struct HttpQueue {
    client: Client,
    queue_url: Url,
    index_url: Url,
}

impl HttpQueue {
    /// Create a new client
    pub fn new(config: HttpQueueConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            queue_url: base_url(&config.queue_url)?,
            index_url: base_url(&config.index_url)?,
        })
    }

    fn task_url(&self, base: &Url, id: &str) -> Result<Url> {
        Ok(base.join(&format!("task/{}", id))?)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<(StatusCode, Option<T>)> {
        debug!("Making {} request to {}", method, url);

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok((status, None));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(QueueError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok((status, Some(response.json().await?)))
    }
}

/// Parse a base URL so relative joins append instead of replacing the last segment
fn base_url(raw: &str) -> Result<Url> {
    let mut raw = raw.to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Ok(Url::parse(&raw)?)
}

#[async_trait::async_trait]
impl QueueService for HttpQueue {
    fn name(&self) -> &str {
        "http"
    }

    async fn create_task(&self, task_id: &str, definition: &Value) -> Result<Value> {
        let url = self.task_url(&self.queue_url, task_id)?;
        let (status, body) = self.request(Method::PUT, url, Some(definition)).await?;
        body.ok_or_else(|| QueueError::ApiError {
            status: status.as_u16(),
            message: format!("queue endpoint not found while creating {}", task_id),
        })
    }

    async fn task(&self, task_id: &str) -> Result<Value> {
        let url = self.task_url(&self.queue_url, task_id)?;
        let (_, body) = self.request(Method::GET, url, None).await?;
        body.ok_or_else(|| QueueError::TaskNotFound(task_id.to_string()))
    }

    async fn find_task(&self, index_path: &str) -> Result<IndexedTask> {
        let url = self.task_url(&self.index_url, index_path)?;
        let (_, body) = self.request(Method::GET, url, None).await?;
        body.ok_or_else(|| QueueError::IndexNotFound(index_path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpQueue {
        HttpQueue::new(HttpQueueConfig {
            queue_url: "http://taskcluster/queue/v1".to_string(),
            index_url: "http://taskcluster/index/v1/".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_task_url_appends_to_base() {
        let queue = client();
        let url = queue.task_url(&queue.queue_url, "abc123").unwrap();
        assert_eq!(url.as_str(), "http://taskcluster/queue/v1/task/abc123");
    }

    #[test]
    fn test_index_url_keeps_dotted_namespace() {
        let queue = client();
        let url = queue
            .task_url(&queue.index_url, "project.mobile.fenix.latest")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://taskcluster/index/v1/task/project.mobile.fenix.latest"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpQueue::new(HttpQueueConfig {
            queue_url: "not a url".to_string(),
            index_url: "http://taskcluster/index/v1".to_string(),
            timeout: Duration::from_secs(5),
        });
        assert!(matches!(result, Err(QueueError::InvalidUrl(_))));
    }
}
