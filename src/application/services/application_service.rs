use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::transport::http_client::RestClient;

/// Job-application tracking endpoints. Application records are opaque
/// payloads; the backend owns their shape.
pub struct ApplicationService<C: RestClient> {
    client: Arc<C>,
}

impl<C: RestClient> ApplicationService<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Value, ApiError> {
        debug!("listing applications");
        let envelope = self
            .client
            .request_value(Method::GET, "/applications", None)
            .await?;
        Ok(envelope.data)
    }

    pub async fn create(&self, application: Value) -> Result<Value, ApiError> {
        debug!("creating application");
        let envelope = self
            .client
            .request_value(Method::POST, "/applications", Some(application))
            .await?;
        Ok(envelope.data)
    }

    pub async fn update(&self, id: i64, application: Value) -> Result<Value, ApiError> {
        debug!("updating application {}", id);
        let envelope = self
            .client
            .request_value(Method::PUT, &format!("/applications/{id}"), Some(application))
            .await?;
        Ok(envelope.data)
    }

    pub async fn delete(&self, id: i64) -> Result<Value, ApiError> {
        debug!("deleting application {}", id);
        let envelope = self
            .client
            .request_value(Method::DELETE, &format!("/applications/{id}"), None)
            .await?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests_application_service {
    use super::*;
    use crate::application::services::test_support::create_client;
    use crate::utils::logger::setup_logger;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_applications() {
        setup_logger();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/applications")
            .with_status(200)
            .with_body(r#"[{"id": 1, "company": "Acme"}]"#)
            .create_async()
            .await;

        let service = ApplicationService::new(create_client(&server));
        let applications = service.list().await.unwrap();

        assert_eq!(applications, json!([{"id": 1, "company": "Acme"}]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_forwards_payload() {
        setup_logger();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/applications")
            .match_body(Matcher::Json(json!({"company": "Acme", "role": "Engineer"})))
            .with_status(201)
            .with_body(r#"{"id": 2, "company": "Acme", "role": "Engineer"}"#)
            .create_async()
            .await;

        let service = ApplicationService::new(create_client(&server));
        let created = service
            .create(json!({"company": "Acme", "role": "Engineer"}))
            .await
            .unwrap();

        assert_eq!(created["id"], 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_targets_id_path() {
        setup_logger();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/applications/5")
            .with_status(200)
            .with_body(r#"{"id": 5, "stage": "interview"}"#)
            .create_async()
            .await;

        let service = ApplicationService::new(create_client(&server));
        let updated = service.update(5, json!({"stage": "interview"})).await.unwrap();

        assert_eq!(updated["stage"], "interview");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_tolerates_empty_body() {
        setup_logger();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/applications/5")
            .with_status(204)
            .create_async()
            .await;

        let service = ApplicationService::new(create_client(&server));
        let deleted = service.delete(5).await.unwrap();

        assert_eq!(deleted, serde_json::Value::Null);
        mock.assert_async().await;
    }
}
