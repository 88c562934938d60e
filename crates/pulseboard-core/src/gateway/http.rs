use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{Gateway, GatewayError, GatewayResult, NewTask, StatusExtras, TaskUpdate};
use crate::config::DashboardConfig;
use crate::models::{
    AccessEntry, AssistantProfile, Heartbeat, NewAccessEntry, Task, TaskStatus,
};

/// Worker API client over HTTPS
#[derive(Clone)]
pub struct HttpGateway {
    base_url: Option<String>,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ContentEnvelope {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ProfileEnvelope {
    profile: AssistantProfile,
}

impl HttpGateway {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        let api_key = api_key.filter(|key| !key.is_empty());
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(config.worker_url.clone(), config.api_key.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Base URL plus percent-encoded path segments; ids may contain `/` or `?`
    fn url(&self, segments: &[&str]) -> GatewayResult<Url> {
        let base = self.base_url.as_deref().ok_or(GatewayError::NotConfigured)?;
        let invalid = || GatewayError::InvalidUrl(base.to_string());
        let mut url = Url::parse(base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> GatewayResult<T> {
        let url = self.url(segments)?;
        tracing::debug!(%method, %url, "worker request");

        let mut request = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(error_for_status(status, &text));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Message from the body's `error` field, else the raw JSON, else a generic status line
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => match value.get("error").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => value.to_string(),
        },
        Err(_) => format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        ),
    }
}

fn error_for_status(status: StatusCode, body: &str) -> GatewayError {
    let message = error_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED => GatewayError::Unauthorized,
        StatusCode::NOT_FOUND => GatewayError::NotFound(message),
        _ => GatewayError::Remote {
            status: status.as_u16(),
            message,
        },
    }
}

impl Gateway for HttpGateway {
    async fn list_tasks(&self) -> GatewayResult<Vec<Task>> {
        let tasks: Option<Vec<Task>> = self.call(Method::GET, &["api", "tasks"], None).await?;
        Ok(tasks.unwrap_or_default())
    }

    async fn create_task(&self, task: NewTask) -> GatewayResult<Task> {
        let body = serde_json::to_value(&task)?;
        self.call(Method::POST, &["api", "tasks"], Some(body)).await
    }

    async fn update_task(&self, id: &str, update: TaskUpdate) -> GatewayResult<Task> {
        let body = serde_json::to_value(&update)?;
        self.call(Method::PUT, &["api", "tasks", id], Some(body))
            .await
    }

    async fn update_task_status(
        &self,
        id: &str,
        status: TaskStatus,
        extras: StatusExtras,
    ) -> GatewayResult<Task> {
        let mut body = serde_json::to_value(&extras)?;
        body["status"] = json!(status);
        self.call(Method::PUT, &["api", "tasks", id, "status"], Some(body))
            .await
    }

    async fn delete_task(&self, id: &str) -> GatewayResult<()> {
        let _: Value = self
            .call(Method::DELETE, &["api", "tasks", id], None)
            .await?;
        Ok(())
    }

    async fn get_heartbeat(&self) -> GatewayResult<Heartbeat> {
        self.call(Method::GET, &["api", "heartbeat"], None).await
    }

    async fn update_heartbeat(&self, heartbeat: &Heartbeat) -> GatewayResult<Heartbeat> {
        let body = serde_json::to_value(heartbeat)?;
        self.call(Method::PUT, &["api", "heartbeat"], Some(body)).await
    }

    async fn get_heartbeat_content(&self) -> GatewayResult<String> {
        let envelope: ContentEnvelope =
            self.call(Method::GET, &["api", "heartbeat", "content"], None).await?;
        Ok(envelope.content.unwrap_or_default())
    }

    async fn update_heartbeat_content(&self, content: &str) -> GatewayResult<String> {
        let envelope: ContentEnvelope = self
            .call(
                Method::POST,
                &["api", "heartbeat", "content"],
                Some(json!({ "content": content })),
            )
            .await?;
        Ok(envelope.content.unwrap_or_default())
    }

    async fn get_assistant_profile(&self) -> GatewayResult<AssistantProfile> {
        self.call(Method::GET, &["api", "assistant", "profile"], None).await
    }

    async fn update_assistant_profile(
        &self,
        profile: &AssistantProfile,
    ) -> GatewayResult<AssistantProfile> {
        let body = serde_json::to_value(profile)?;
        let envelope: ProfileEnvelope = self
            .call(Method::POST, &["api", "assistant", "profile"], Some(body))
            .await?;
        Ok(envelope.profile)
    }

    async fn list_access(&self) -> GatewayResult<Vec<AccessEntry>> {
        let entries: Option<Vec<AccessEntry>> =
            self.call(Method::GET, &["api", "access"], None).await?;
        Ok(entries.unwrap_or_default())
    }

    async fn create_access(&self, entry: NewAccessEntry) -> GatewayResult<AccessEntry> {
        let body = serde_json::to_value(&entry)?;
        self.call(Method::POST, &["api", "access"], Some(body)).await
    }

    async fn update_access(&self, id: &str, entry: NewAccessEntry) -> GatewayResult<AccessEntry> {
        let body = serde_json::to_value(&entry)?;
        self.call(Method::PUT, &["api", "access", id], Some(body))
            .await
    }

    async fn delete_access(&self, id: &str) -> GatewayResult<()> {
        let _: Value = self
            .call(Method::DELETE, &["api", "access", id], None)
            .await?;
        Ok(())
    }

    async fn reset(&self) -> GatewayResult<()> {
        let _: Value = self.call(Method::POST, &["api", "reset"], None).await?;
        Ok(())
    }

    async fn discover(&self) -> GatewayResult<Value> {
        self.call(Method::GET, &[], None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slashes_are_stripped() {
        let gateway = HttpGateway::new(Some("https://worker.example.com///".into()), None);
        assert_eq!(gateway.base_url(), Some("https://worker.example.com"));
        assert_eq!(
            gateway.url(&["api", "tasks"]).unwrap().as_str(),
            "https://worker.example.com/api/tasks"
        );
    }

    #[test]
    fn test_blank_url_is_not_configured() {
        let gateway = HttpGateway::new(Some("  ".into()), Some(String::new()));
        assert!(!gateway.is_configured());
        assert!(matches!(gateway.url(&["api", "tasks"]), Err(GatewayError::NotConfigured)));
    }

    #[test]
    fn test_ids_are_encoded_as_one_segment() {
        let gateway = HttpGateway::new(Some("https://worker.example.com".into()), None);
        assert_eq!(
            gateway.url(&["api", "tasks", "a/b?c#d", "status"]).unwrap().as_str(),
            "https://worker.example.com/api/tasks/a%2Fb%3Fc%23d/status"
        );
    }

    #[test]
    fn test_base_path_prefix_is_kept() {
        let gateway = HttpGateway::new(Some("https://example.com/worker/".into()), None);
        assert_eq!(
            gateway.url(&["api", "access", "x"]).unwrap().as_str(),
            "https://example.com/worker/api/access/x"
        );
        assert_eq!(gateway.url(&[]).unwrap().as_str(), "https://example.com/worker");
    }

    #[test]
    fn test_unparsable_base_is_a_configuration_error() {
        let gateway = HttpGateway::new(Some("not a url".into()), None);
        let err = gateway.url(&["api", "tasks"]).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidUrl(_)));
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_unconfigured_call_fails_before_network() {
        let gateway = HttpGateway::new(None, None);
        let err = gateway.list_tasks().await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"Name is required"}"#),
            "Name is required"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"detail":"nope"}"#),
            r#"{"detail":"nope"}"#
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
            "HTTP 502 Bad Gateway"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, r#"{"error":"Unauthorized"}"#),
            GatewayError::Unauthorized
        ));
        match error_for_status(StatusCode::NOT_FOUND, r#"{"error":"Task not found"}"#) {
            GatewayError::NotFound(message) => assert_eq!(message, "Task not found"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            error_for_status(StatusCode::BAD_REQUEST, "{}"),
            GatewayError::Remote { status: 400, .. }
        ));
    }
}
