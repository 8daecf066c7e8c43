//! Client library for the JobTrack job-seeker portal REST API.
//!
//! The centerpiece is [`transport::http_client::ApiHttpClient`]: an
//! authenticated HTTP client that attaches the stored bearer token to
//! every request, normalizes responses into a uniform envelope, and on
//! a 401 performs one single-flight token refresh before replaying the
//! original request. Portal flows (auth, profile, resume upload, job
//! applications) and a generic fetch helper are layered on top of it.

pub mod application;

pub mod config;

pub(crate) mod constants;

pub mod error;

pub mod presentation;

pub mod session;

pub mod storage;

pub mod transport;

pub mod utils;
