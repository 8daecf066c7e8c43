use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{ApiError, ErrorDescriptor};
use crate::session::navigator::Navigator;
use crate::storage::session::SessionStore;
use crate::transport::http_client::RestClient;

/// Access/refresh credential pair returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(
        rename = "firstName",
        alias = "first_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_name: Option<String>,
    #[serde(
        rename = "lastName",
        alias = "last_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Checked locally against `password`, never sent to the backend.
    #[serde(skip)]
    pub password_confirm: String,
}

/// Login, registration and logout flows over the authenticated client.
/// Token persistence itself lives in the client's session store; this
/// service drives it.
pub struct AuthService<C: RestClient> {
    client: Arc<C>,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl<C: RestClient> AuthService<C> {
    pub fn new(client: Arc<C>, session: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            client,
            session,
            navigator,
        }
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &LoginRequest) -> Result<User, ApiError> {
        let envelope = self
            .client
            .request_value(
                Method::POST,
                "/auth/login/",
                Some(serde_json::to_value(credentials)?),
            )
            .await?;

        let tokens: TokenPair = serde_json::from_value(envelope.data)?;
        self.session.set_tokens(&tokens);

        let user = self.get_user().await?;
        self.session.set_cached_user(&user);
        debug!("login successful");
        Ok(user)
    }

    /// Presence checks and password confirmation only; anything richer
    /// is the backend's call. On success registers and logs in.
    pub async fn register(&self, details: &RegisterRequest) -> Result<User, ApiError> {
        if let Some(errors) = validate_registration(details) {
            return Err(ApiError::Api(
                ErrorDescriptor::new("Validation failed", 400).with_errors(errors),
            ));
        }

        self.client
            .request_value(
                Method::POST,
                "/auth/register/",
                Some(serde_json::to_value(details)?),
            )
            .await?;

        self.login(&LoginRequest {
            username: details.username.clone(),
            password: details.password.clone(),
        })
        .await
    }

    pub async fn get_user(&self) -> Result<User, ApiError> {
        let envelope = self
            .client
            .request_value(Method::GET, "/auth/user/", None)
            .await?;
        Ok(serde_json::from_value(envelope.data)?)
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.cached_user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Local-only: drops the credential pair and cached user, then
    /// sends the navigator to the login route.
    pub fn logout(&self) {
        debug!("logging out");
        self.session.clear();
        self.navigator.redirect_to_login();
    }
}

fn validate_registration(details: &RegisterRequest) -> Option<HashMap<String, Vec<String>>> {
    let mut errors: HashMap<String, Vec<String>> = HashMap::new();
    let required = "This field is required.";

    if details.username.trim().is_empty() {
        errors.insert("username".to_string(), vec![required.to_string()]);
    }
    if details.email.trim().is_empty() {
        errors.insert("email".to_string(), vec![required.to_string()]);
    }
    if details.password.is_empty() {
        errors.insert("password".to_string(), vec![required.to_string()]);
    }
    if details.password != details.password_confirm {
        errors
            .entry("passwordConfirm".to_string())
            .or_default()
            .push("Passwords don't match.".to_string());
    }

    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}
