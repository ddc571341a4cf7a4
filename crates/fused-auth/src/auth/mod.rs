/*
[INPUT]:  Identity, bearer tokens, credential storage
[OUTPUT]: Sign-in sessions, decoded claims, validity decisions
[POS]:    Auth layer - handles magic-link authentication
[UPDATE]: When auth flow, token checks or storage change
*/

pub mod session;
pub mod store;
pub mod token;
pub mod validity;

pub use session::{AuthSession, AuthSessionBuilder, LoginOutcome, SessionState};
pub use store::{
    CredentialStore, DEFAULT_KEY_PREFIX, FileCredentialStore, MemoryCredentialStore, StorageKey,
};
pub use token::{Claims, SignaturePolicy, decode_claims};
pub use validity::{ClaimValidator, TimeClaimPolicy, TokenRejection, TokenValidator};
