/*
[INPUT]:  Identity, HTTP client, credential store, validity predicate
[OUTPUT]: Registration codes, magic links, persisted bearer tokens
[POS]:    Auth layer - orchestrates the register / login / logout flow
[UPDATE]: When auth endpoints, session states or validation rules change
*/

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::http::{FusedClient, FusedError, Result};
use crate::types::Identity;

use super::store::{CredentialStore, DEFAULT_KEY_PREFIX, StorageKey};
use super::token::{CLAIM_ADDRESS, Claims, SignaturePolicy, decode_claims};
use super::validity::{ClaimValidator, TokenRejection, TokenValidator};

/// Where a session stands in the sign-in flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No pending code and no valid stored token
    Unregistered,
    /// Registered and waiting for the magic link to be used
    Registered { code: String },
    /// A valid token is stored for this identity
    Authenticated,
}

/// How a login call finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// A still-valid token was already stored; no request was made
    AlreadyAuthenticated,
    /// A fresh token was received and stored
    Authenticated,
}

/// Sign-in session for one (subject, application) pair
///
/// Operations take `&mut self` when they move the session between states,
/// so a session is driven by one task at a time. Independent sessions share
/// nothing but the credential store.
pub struct AuthSession {
    identity: Identity,
    client: FusedClient,
    store: Arc<dyn CredentialStore>,
    storage_key: StorageKey,
    validator: Arc<dyn TokenValidator>,
    signature_policy: SignaturePolicy,
    pending_code: Option<String>,
    warned_unverified: AtomicBool,
}

impl AuthSession {
    /// Create a session with the default key prefix, validator and signature policy
    pub fn new(client: FusedClient, store: Arc<dyn CredentialStore>, identity: Identity) -> Self {
        AuthSessionBuilder::new(identity, store).finish(client)
    }

    pub fn builder(identity: Identity, store: Arc<dyn CredentialStore>) -> AuthSessionBuilder {
        AuthSessionBuilder::new(identity, store)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn client(&self) -> &FusedClient {
        &self.client
    }

    pub fn storage_key(&self) -> &StorageKey {
        &self.storage_key
    }

    /// Registration code awaiting login, if any
    pub fn pending_code(&self) -> Option<&str> {
        self.pending_code.as_deref()
    }

    pub fn state(&self) -> SessionState {
        if let Some(code) = &self.pending_code {
            return SessionState::Registered { code: code.clone() };
        }
        if self.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Unregistered
        }
    }

    /// Step 1: Register - ask the service to email a magic link
    ///
    /// POST /fused/register
    pub async fn register(&mut self) -> Result<String> {
        info!(
            kind = ?self.identity.kind(),
            app_id = %self.identity.app_id(),
            "registering identity"
        );
        let response = self.client.register(&self.identity).await?;

        let code = response.code.trim();
        if code.is_empty() {
            return Err(FusedError::Protocol(
                "registration response carried an empty code".to_string(),
            ));
        }

        self.pending_code = Some(code.to_string());
        debug!("registration code received");
        Ok(code.to_string())
    }

    /// Magic link for the pending registration, for QR codes or deep links
    ///
    /// POST /fused/getMagicLink
    pub async fn magic_link(&self) -> Result<String> {
        let code = self
            .pending_code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or(FusedError::NotRegistered)?;

        let response = self
            .client
            .magic_link(code, self.identity.app_id())
            .await?;
        if response.magic_link.trim().is_empty() {
            return Err(FusedError::Protocol(
                "magic link response carried an empty link".to_string(),
            ));
        }
        Ok(response.magic_link)
    }

    /// Step 2: Wait until the user follows the emailed link
    ///
    /// POST /fused/login
    ///
    /// Returns immediately when a valid token is already stored. The request
    /// itself can stay open for several minutes; dropping the returned future
    /// leaves the session registered and retryable.
    pub async fn await_login(&mut self) -> Result<LoginOutcome> {
        if self.has_usable_token()? {
            self.pending_code = None;
            debug!("stored token still valid, skipping login");
            return Ok(LoginOutcome::AlreadyAuthenticated);
        }

        let code = self.pending_code.clone().ok_or(FusedError::NotRegistered)?;

        info!(app_id = %self.identity.app_id(), "waiting for magic link confirmation");
        let response = self.client.login(&code, self.identity.app_id()).await?;

        let token = response.token.trim();
        if token.is_empty() {
            return Err(FusedError::Protocol(
                "login response carried an empty token".to_string(),
            ));
        }

        let claims = self.validate(token)?;
        self.store.save(&self.storage_key, token)?;
        self.pending_code = None;

        info!(address = claims.address().unwrap_or_default(), "login complete");
        Ok(LoginOutcome::Authenticated)
    }

    /// Same as [`await_login`](Self::await_login), abandoned when `cancel` fires
    pub async fn await_login_with_cancel(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<LoginOutcome> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("login cancelled, registration code kept");
                Err(FusedError::Cancelled)
            }
            outcome = self.await_login() => outcome,
        }
    }

    /// Register (unless a valid token is stored) and wait for login
    pub async fn login(&mut self) -> Result<LoginOutcome> {
        if self.has_usable_token()? {
            self.pending_code = None;
            return Ok(LoginOutcome::AlreadyAuthenticated);
        }
        self.register().await?;
        self.await_login().await
    }

    /// Forget the stored token and any pending code
    pub fn logout(&mut self) -> Result<()> {
        self.store.remove(&self.storage_key)?;
        self.pending_code = None;
        info!(app_id = %self.identity.app_id(), "logged out");
        Ok(())
    }

    /// Stored token, only if it passes every check
    pub fn bearer_token(&self) -> Result<String> {
        let token = self.load_token()?;
        self.validate(&token)?;
        Ok(token)
    }

    /// Claims of the stored token, only if it passes every check
    pub fn claims(&self) -> Result<Claims> {
        let token = self.load_token()?;
        self.validate(&token)
    }

    /// Wallet address from the stored token
    pub fn address(&self) -> Result<String> {
        let claims = self.claims()?;
        claims
            .address()
            .map(str::to_string)
            .ok_or(FusedError::TokenInvalid(TokenRejection::MissingClaim(
                CLAIM_ADDRESS,
            )))
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_ok()
    }

    fn load_token(&self) -> Result<String> {
        self.store
            .load(&self.storage_key)?
            .ok_or(FusedError::NotAuthenticated)
    }

    /// Distinguish "no usable token" from a failing store
    fn has_usable_token(&self) -> Result<bool> {
        match self.bearer_token() {
            Ok(_) => Ok(true),
            Err(FusedError::NotAuthenticated) => Ok(false),
            Err(FusedError::TokenInvalid(reason)) => {
                debug!(%reason, "stored token not usable");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    fn validate(&self, token: &str) -> Result<Claims> {
        self.signature_policy.verify(token)?;
        if !self.signature_policy.is_verified()
            && !self.warned_unverified.swap(true, Ordering::Relaxed)
        {
            warn!("trusting bearer token without signature verification");
        }

        let claims = decode_claims(token)?;
        self.validator
            .check(&claims, self.identity.app_id(), Utc::now())?;
        Ok(claims)
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("identity", &self.identity)
            .field("storage_key", &self.storage_key)
            .field("signature_policy", &self.signature_policy)
            .field("pending", &self.pending_code.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for sessions that need a non-default client, prefix or validator
pub struct AuthSessionBuilder {
    identity: Identity,
    store: Arc<dyn CredentialStore>,
    client: Option<FusedClient>,
    key_prefix: String,
    validator: Arc<dyn TokenValidator>,
    signature_policy: SignaturePolicy,
}

impl AuthSessionBuilder {
    pub fn new(identity: Identity, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            identity,
            store,
            client: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            validator: Arc::new(ClaimValidator::default()),
            signature_policy: SignaturePolicy::default(),
        }
    }

    pub fn client(mut self, client: FusedClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn validator(mut self, validator: impl TokenValidator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn signature_policy(mut self, policy: SignaturePolicy) -> Self {
        self.signature_policy = policy;
        self
    }

    /// Build the session, creating a default client if none was given
    pub fn build(mut self) -> Result<AuthSession> {
        if self.key_prefix.is_empty() {
            return Err(FusedError::Config("key prefix must not be empty".to_string()));
        }
        let client = match self.client.take() {
            Some(client) => client,
            None => FusedClient::new()?,
        };
        Ok(self.finish(client))
    }

    fn finish(self, client: FusedClient) -> AuthSession {
        let storage_key = StorageKey::new(&self.key_prefix, &self.identity);
        AuthSession {
            identity: self.identity,
            client,
            store: self.store,
            storage_key,
            validator: self.validator,
            signature_policy: self.signature_policy,
            pending_code: None,
            warned_unverified: AtomicBool::new(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::auth::MemoryCredentialStore;
    use crate::http::ClientConfig;

    fn make_token(app_id: &str, exp_offset_secs: i64) -> String {
        let header = serde_json::json!({"alg": "HS256", "typ": "JWT"});
        let payload = serde_json::json!({
            "address": "0xfeed",
            "appId": app_id,
            "exp": Utc::now().timestamp() + exp_offset_secs,
        });
        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap());
        let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
        format!("{header_b64}.{payload_b64}.signature")
    }

    fn session_for(server: &MockServer, store: &MemoryCredentialStore) -> AuthSession {
        let client =
            FusedClient::with_config_and_base_url(ClientConfig::default(), &server.uri()).unwrap();
        AuthSession::new(
            client,
            Arc::new(store.clone()),
            Identity::email("a@b.com", "app1"),
        )
    }

    #[tokio::test]
    async fn test_new_session_is_unregistered() {
        let server = MockServer::start().await;
        let session = session_for(&server, &MemoryCredentialStore::new());
        assert_eq!(session.state(), SessionState::Unregistered);
        assert!(matches!(
            session.bearer_token(),
            Err(FusedError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_stored_valid_token_means_authenticated() {
        let server = MockServer::start().await;
        let store = MemoryCredentialStore::new();
        let session = session_for(&server, &store);
        store
            .save(session.storage_key(), &make_token("app1", 600))
            .unwrap();

        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.address().unwrap(), "0xfeed");
    }

    #[tokio::test]
    async fn test_register_rejects_empty_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fused/register"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": "  ",
            })))
            .mount(&server)
            .await;

        let mut session = session_for(&server, &MemoryCredentialStore::new());
        let err = session.register().await.unwrap_err();
        assert!(matches!(err, FusedError::Protocol(_)));
        assert_eq!(session.state(), SessionState::Unregistered);
    }

    #[tokio::test]
    async fn test_await_login_requires_registration() {
        let server = MockServer::start().await;
        let mut session = session_for(&server, &MemoryCredentialStore::new());
        let err = session.await_login().await.unwrap_err();
        assert!(matches!(err, FusedError::NotRegistered));
    }

    #[tokio::test]
    async fn test_cancelled_login_keeps_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fused/register"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": "XYZ",
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/fused/login"))
            .and(body_string("code=XYZ&appId=app1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"token": make_token("app1", 600)}))
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let store = MemoryCredentialStore::new();
        let mut session = session_for(&server, &store);
        session.register().await.unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let err = session.await_login_with_cancel(&cancel).await.unwrap_err();
        assert!(matches!(err, FusedError::Cancelled));
        assert_eq!(
            session.state(),
            SessionState::Registered {
                code: "XYZ".to_string()
            }
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_login_rejects_token_for_other_app() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fused/register"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": "XYZ",
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/fused/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": make_token("someone-else", 600),
            })))
            .mount(&server)
            .await;

        let store = MemoryCredentialStore::new();
        let mut session = session_for(&server, &store);
        let err = session.login().await.unwrap_err();

        assert!(matches!(
            err,
            FusedError::TokenInvalid(TokenRejection::AppIdMismatch { .. })
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_builder_custom_prefix_and_validator() {
        let server = MockServer::start().await;
        let store = MemoryCredentialStore::new();
        let client =
            FusedClient::with_config_and_base_url(ClientConfig::default(), &server.uri()).unwrap();

        let session = AuthSession::builder(Identity::uuid("dev-1", "app1"), Arc::new(store.clone()))
            .client(client)
            .key_prefix("game")
            .validator(|_: &Claims, _: &str, _: chrono::DateTime<Utc>| {
                Ok::<(), TokenRejection>(())
            })
            .build()
            .unwrap();

        assert_eq!(session.storage_key().as_str(), "game.dev-1.app1");

        // accepted only because the custom validator ignores every claim
        store
            .save(session.storage_key(), &make_token("other", -600))
            .unwrap();
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_builder_rejects_empty_prefix() {
        let err = AuthSession::builder(
            Identity::email("a@b.com", "app1"),
            Arc::new(MemoryCredentialStore::new()),
        )
        .key_prefix("")
        .build()
        .unwrap_err();
        assert!(matches!(err, FusedError::Config(_)));
    }
}
