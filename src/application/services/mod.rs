pub mod application_service;
pub mod profile_service;
pub mod resume_service;

#[cfg(test)]
pub(crate) mod test_support {
    use mockito::Server;
    use std::sync::Arc;

    use crate::config::{Config, Environment, RestApiConfig};
    use crate::storage::session::SessionStore;
    use crate::transport::http_client::ApiHttpClient;

    pub(crate) fn create_client(server: &Server) -> Arc<ApiHttpClient> {
        let config = Config {
            environment: Environment::Test,
            rest_api: RestApiConfig {
                base_url: server.url(),
                timeout: 5,
            },
        };
        let session = Arc::new(SessionStore::in_memory());
        Arc::new(ApiHttpClient::new(&config, session).unwrap())
    }
}
