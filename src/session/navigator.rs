use tracing::warn;

use crate::constants::LOGIN_ROUTE;

/// Where the client sends the user when the session is irrecoverable.
/// The embedding shell supplies the real implementation: a full page
/// redirect in a browser shell, a screen swap in a desktop one.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Default navigator: records the redirect in the log and leaves the
/// actual navigation to whoever watches it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect_to_login(&self) {
        warn!("session expired, redirecting to {}", LOGIN_ROUTE);
    }
}
