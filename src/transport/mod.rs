pub mod http_client;
pub(crate) mod middleware;
pub mod model;
pub(crate) mod refresh;
