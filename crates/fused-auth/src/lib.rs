/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public magic-link auth client surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod account;
pub mod auth;
pub mod http;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    AuthSession,
    AuthSessionBuilder,
    ClaimValidator,
    Claims,
    CredentialStore,
    FileCredentialStore,
    LoginOutcome,
    MemoryCredentialStore,
    SessionState,
    SignaturePolicy,
    StorageKey,
    TimeClaimPolicy,
    TokenRejection,
    TokenValidator,
    decode_claims,
};

// Re-export commonly used types from http
pub use http::{
    ClientConfig,
    DEFAULT_BASE_URL,
    ErrorKind,
    FusedClient,
    FusedError,
    Result,
};

// Re-export all types
pub use types::*;

// Cancellation handle accepted by `AuthSession::await_login_with_cancel`
pub use tokio_util::sync::CancellationToken;
