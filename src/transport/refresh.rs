use std::future::Future;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ApiError;
use crate::storage::session::SessionStore;

/// Single-flight gate for token refresh. The first 401 performs the
/// refresh; concurrent 401s wait on the gate and reuse the token the
/// winner stored instead of issuing duplicate refresh calls.
#[derive(Debug, Default)]
pub(crate) struct RefreshGate {
    lock: Mutex<()>,
}

impl RefreshGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Runs `refresh` unless another task already replaced `stale`
    /// while this one waited for the gate; in that case the stored
    /// token is reused without a network call.
    pub(crate) async fn run<F, Fut>(
        &self,
        session: &SessionStore,
        stale: Option<String>,
        refresh: F,
    ) -> Result<String, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, ApiError>>,
    {
        let _guard = self.lock.lock().await;
        if let Some(current) = session.access_token() {
            if stale.as_deref() != Some(current.as_str()) {
                debug!("access token already refreshed by a concurrent request");
                return Ok(current);
            }
        }
        refresh().await
    }
}

#[cfg(test)]
mod tests_refresh_gate {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_refresh_runs_when_token_unchanged() {
        let session = SessionStore::in_memory();
        session.set_access_token("old");
        let gate = RefreshGate::new();
        let calls = AtomicUsize::new(0);

        let token = gate
            .run(&session, Some("old".to_string()), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                session.set_access_token("new");
                Ok("new".to_string())
            })
            .await
            .unwrap();

        assert_eq!(token, "new");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_skipped_when_token_already_rotated() {
        let session = SessionStore::in_memory();
        session.set_access_token("new");
        let gate = RefreshGate::new();
        let calls = AtomicUsize::new(0);

        // this task saw a 401 with "old" attached, but a concurrent
        // request already rotated the token
        let token = gate
            .run(&session, Some("old".to_string()), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("unused".to_string())
            })
            .await
            .unwrap();

        assert_eq!(token, "new");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_runs_when_session_was_cleared() {
        let session = SessionStore::in_memory();
        let gate = RefreshGate::new();
        let calls = AtomicUsize::new(0);

        let outcome = gate
            .run(&session, Some("old".to_string()), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::internal("no refresh token"))
            })
            .await;

        assert!(outcome.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
