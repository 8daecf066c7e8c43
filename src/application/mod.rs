pub mod fetch;
pub mod services;
