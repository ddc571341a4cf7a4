/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod account;
pub mod client;
pub mod error;
pub mod fused;

pub use error::{ErrorKind, FusedError, Result};

pub use client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_LOGIN_TIMEOUT, FusedClient};
