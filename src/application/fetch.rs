use reqwest::Method;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::error::ErrorDescriptor;
use crate::presentation::display::{display_error, ErrorDisplayMode};
use crate::transport::http_client::RestClient;

/// Knobs callers tune per fetch handle.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// When set, failures are also surfaced through this channel in
    /// addition to being stored on the handle.
    pub error_mode: Option<ErrorDisplayMode>,
    /// Execute once on construction (see [`Fetcher::mount`]) and again
    /// on every endpoint or dependency change passed to [`Fetcher::sync`].
    pub auto_execute: bool,
    pub initial_data: Option<Value>,
    /// Values watched for change by [`Fetcher::sync`].
    pub dependencies: Vec<Value>,
}

#[derive(Debug, Clone, Default)]
struct FetchState {
    data: Option<Value>,
    loading: bool,
    error: Option<ErrorDescriptor>,
}

/// Tracks loading/error/data state around calls issued through a
/// client. `execute` is the sole entry point that performs a call;
/// `data` keeps its last-known-good value across failures.
pub struct Fetcher<C: RestClient> {
    client: Arc<C>,
    endpoint: Option<String>,
    method: Method,
    body: Option<Value>,
    options: FetchOptions,
    dependencies: Vec<Value>,
    state: Mutex<FetchState>,
}

impl<C: RestClient> Fetcher<C> {
    pub fn new(
        client: Arc<C>,
        endpoint: Option<&str>,
        method: Method,
        body: Option<Value>,
        options: FetchOptions,
    ) -> Self {
        let state = FetchState {
            data: options.initial_data.clone(),
            loading: false,
            error: None,
        };
        let dependencies = options.dependencies.clone();
        Self {
            client,
            endpoint: endpoint.map(str::to_string),
            method,
            body,
            options,
            dependencies,
            state: Mutex::new(state),
        }
    }

    /// Constructor counterpart of mounting with `auto_execute`: runs
    /// the first call immediately when an endpoint is resolvable.
    pub async fn mount(
        client: Arc<C>,
        endpoint: Option<&str>,
        method: Method,
        body: Option<Value>,
        options: FetchOptions,
    ) -> Self {
        let fetcher = Self::new(client, endpoint, method, body, options);
        if fetcher.options.auto_execute && fetcher.endpoint.is_some() {
            fetcher.execute().await;
        }
        fetcher
    }

    pub fn data(&self) -> Option<Value> {
        self.state().data.clone()
    }

    pub fn loading(&self) -> bool {
        self.state().loading
    }

    pub fn error(&self) -> Option<ErrorDescriptor> {
        self.state().error.clone()
    }

    pub async fn execute(&self) -> Option<Value> {
        self.execute_with(None, None, None).await
    }

    /// Performs the call, optionally overriding the configured
    /// endpoint, method or body for this invocation only.
    pub async fn execute_with(
        &self,
        endpoint: Option<&str>,
        method: Option<Method>,
        body: Option<Value>,
    ) -> Option<Value> {
        let url = match endpoint.map(str::to_string).or_else(|| self.endpoint.clone()) {
            Some(url) => url,
            None => {
                let descriptor = ErrorDescriptor::new("No endpoint specified for API call", 400);
                self.state().error = Some(descriptor);
                return None;
            }
        };
        let method = method.unwrap_or_else(|| self.method.clone());
        let body = body.or_else(|| self.body.clone());

        {
            let mut state = self.state();
            state.loading = true;
            state.error = None;
        }

        let outcome = self.client.request_value(method, &url, body).await;

        match outcome {
            Ok(envelope) => {
                let mut state = self.state();
                state.loading = false;
                state.error = None;
                state.data = Some(envelope.data.clone());
                Some(envelope.data)
            }
            Err(error) => {
                let descriptor = error.descriptor().clone();
                {
                    let mut state = self.state();
                    state.loading = false;
                    state.error = Some(descriptor.clone());
                    // data untouched: last-known-good
                }
                if let Some(mode) = self.options.error_mode {
                    display_error(&descriptor, mode);
                }
                None
            }
        }
    }

    /// Re-runs the configured call; a handle without an endpoint is a
    /// no-op rather than an error.
    pub async fn refresh(&self) -> Option<Value> {
        if self.endpoint.is_some() {
            self.execute().await
        } else {
            None
        }
    }

    /// Reactive recomputation keyed on the endpoint and dependency
    /// values: callers pass the current values each pass, and the
    /// fetch re-executes only when something changed (never a polling
    /// loop). Returns whether a call was issued.
    pub async fn sync(&mut self, endpoint: Option<&str>, dependencies: Vec<Value>) -> bool {
        let next_endpoint = endpoint.map(str::to_string);
        let changed = next_endpoint != self.endpoint || dependencies != self.dependencies;
        self.endpoint = next_endpoint;
        self.dependencies = dependencies;

        if self.options.auto_execute && changed && self.endpoint.is_some() {
            debug!("fetch dependencies changed, re-executing");
            self.execute().await;
            true
        } else {
            false
        }
    }

    fn state(&self) -> MutexGuard<'_, FetchState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests_fetcher {
    use super::*;
    use crate::error::ApiError;
    use crate::transport::model::{ApiResponse, MultipartPayload};
    use crate::utils::logger::setup_logger;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Scripted client: pops one canned outcome per call, optionally
    /// holding each call until the gate is released.
    #[derive(Default)]
    struct FakeClient {
        responses: Mutex<VecDeque<Result<ApiResponse<Value>, ApiError>>>,
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    impl FakeClient {
        fn with_responses(
            responses: Vec<Result<ApiResponse<Value>, ApiError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().collect()),
                calls: AtomicUsize::new(0),
                gate: None,
            })
        }

        fn ok(data: Value) -> Result<ApiResponse<Value>, ApiError> {
            Ok(ApiResponse {
                data,
                status: 200,
                message: Some("OK".to_string()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RestClient for FakeClient {
        async fn request_value(
            &self,
            _method: Method,
            _endpoint: &str,
            _body: Option<Value>,
        ) -> Result<ApiResponse<Value>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::internal("fake client out of responses")))
        }

        async fn upload(
            &self,
            _endpoint: &str,
            _payload: MultipartPayload,
        ) -> Result<ApiResponse<Value>, ApiError> {
            Err(ApiError::internal("upload not scripted"))
        }
    }

    #[tokio::test]
    async fn test_missing_endpoint_fails_without_network_call() {
        setup_logger();
        let client = FakeClient::with_responses(vec![]);
        let fetcher = Fetcher::new(
            client.clone(),
            None,
            Method::GET,
            None,
            FetchOptions::default(),
        );

        let result = fetcher.execute().await;

        assert_eq!(result, None);
        assert_eq!(client.calls(), 0);
        assert!(!fetcher.loading());
        let error = fetcher.error().unwrap();
        assert_eq!(error.message, "No endpoint specified for API call");
        assert_eq!(error.status, 400);
    }

    #[tokio::test]
    async fn test_success_replaces_data_and_clears_error() {
        setup_logger();
        let client = FakeClient::with_responses(vec![
            Err(ApiError::internal("first attempt broke")),
            FakeClient::ok(json!({"id": 1})),
        ]);
        let fetcher = Fetcher::new(
            client.clone(),
            Some("/applications"),
            Method::GET,
            None,
            FetchOptions::default(),
        );

        assert_eq!(fetcher.execute().await, None);
        assert!(fetcher.error().is_some());

        let result = fetcher.execute().await;
        assert_eq!(result, Some(json!({"id": 1})));
        assert_eq!(fetcher.data(), Some(json!({"id": 1})));
        assert_eq!(fetcher.error(), None);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_keeps_last_known_good_data() {
        setup_logger();
        let client = FakeClient::with_responses(vec![
            FakeClient::ok(json!({"id": 1})),
            Err(ApiError::Api(ErrorDescriptor::new("server exploded", 500))),
        ]);
        let fetcher = Fetcher::new(
            client,
            Some("/applications"),
            Method::GET,
            None,
            FetchOptions::default(),
        );

        fetcher.execute().await;
        assert_eq!(fetcher.data(), Some(json!({"id": 1})));

        let result = fetcher.execute().await;
        assert_eq!(result, None);
        assert_eq!(fetcher.data(), Some(json!({"id": 1})));
        assert_eq!(fetcher.error().unwrap().message, "server exploded");
        assert!(!fetcher.loading());
    }

    #[tokio::test]
    async fn test_loading_true_for_full_flight_window() {
        setup_logger();
        let gate = Arc::new(Notify::new());
        let client = Arc::new(FakeClient {
            responses: Mutex::new(VecDeque::from([FakeClient::ok(json!(1))])),
            calls: AtomicUsize::new(0),
            gate: Some(gate.clone()),
        });
        let fetcher = Arc::new(Fetcher::new(
            client,
            Some("/slow"),
            Method::GET,
            None,
            FetchOptions::default(),
        ));

        assert!(!fetcher.loading());
        let task = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.execute().await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(fetcher.loading());

        gate.notify_one();
        let result = task.await.unwrap();
        assert_eq!(result, Some(json!(1)));
        assert!(!fetcher.loading());
    }

    #[tokio::test]
    async fn test_mount_auto_executes_when_endpoint_present() {
        setup_logger();
        let client = FakeClient::with_responses(vec![FakeClient::ok(json!({"count": 3}))]);
        let options = FetchOptions {
            auto_execute: true,
            ..FetchOptions::default()
        };

        let fetcher =
            Fetcher::mount(client.clone(), Some("/stats"), Method::GET, None, options).await;

        assert_eq!(client.calls(), 1);
        assert_eq!(fetcher.data(), Some(json!({"count": 3})));
    }

    #[tokio::test]
    async fn test_mount_without_endpoint_does_not_execute() {
        setup_logger();
        let client = FakeClient::with_responses(vec![]);
        let options = FetchOptions {
            auto_execute: true,
            initial_data: Some(json!({"placeholder": true})),
            ..FetchOptions::default()
        };

        let fetcher = Fetcher::mount(client.clone(), None, Method::GET, None, options).await;

        assert_eq!(client.calls(), 0);
        assert_eq!(fetcher.data(), Some(json!({"placeholder": true})));
        assert_eq!(fetcher.error(), None);
    }

    #[tokio::test]
    async fn test_sync_reexecutes_on_dependency_change_only() {
        setup_logger();
        let client = FakeClient::with_responses(vec![
            FakeClient::ok(json!("page1")),
            FakeClient::ok(json!("page2")),
        ]);
        let options = FetchOptions {
            auto_execute: true,
            dependencies: vec![json!(1)],
            ..FetchOptions::default()
        };
        let mut fetcher =
            Fetcher::mount(client.clone(), Some("/jobs"), Method::GET, None, options).await;
        assert_eq!(client.calls(), 1);

        // same endpoint, same dependencies: nothing happens
        assert!(!fetcher.sync(Some("/jobs"), vec![json!(1)]).await);
        assert_eq!(client.calls(), 1);

        // dependency changed: one more call
        assert!(fetcher.sync(Some("/jobs"), vec![json!(2)]).await);
        assert_eq!(client.calls(), 2);
        assert_eq!(fetcher.data(), Some(json!("page2")));
    }

    #[tokio::test]
    async fn test_sync_reexecutes_on_endpoint_change() {
        setup_logger();
        let client = FakeClient::with_responses(vec![FakeClient::ok(json!("other"))]);
        let options = FetchOptions {
            auto_execute: true,
            ..FetchOptions::default()
        };
        let mut fetcher = Fetcher::new(client.clone(), Some("/jobs"), Method::GET, None, options);

        assert!(fetcher.sync(Some("/applications"), vec![]).await);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_execute_with_overrides() {
        setup_logger();
        let client = FakeClient::with_responses(vec![FakeClient::ok(json!("created"))]);
        let fetcher = Fetcher::new(
            client.clone(),
            None,
            Method::GET,
            None,
            FetchOptions::default(),
        );

        let result = fetcher
            .execute_with(
                Some("/applications"),
                Some(Method::POST),
                Some(json!({"company": "Acme"})),
            )
            .await;

        assert_eq!(result, Some(json!("created")));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_without_endpoint_is_noop() {
        setup_logger();
        let client = FakeClient::with_responses(vec![]);
        let fetcher = Fetcher::new(
            client.clone(),
            None,
            Method::GET,
            None,
            FetchOptions::default(),
        );

        assert_eq!(fetcher.refresh().await, None);
        assert_eq!(client.calls(), 0);
        assert_eq!(fetcher.error(), None);
    }
}
