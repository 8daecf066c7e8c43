pub mod auth;
pub mod navigator;
