/*
[INPUT]:  Identity, registration code, application id
[OUTPUT]: Registration codes, bearer tokens, magic links
[POS]:    HTTP layer - unauthenticated /fused endpoints
[UPDATE]: When registration or login endpoints change
*/

use crate::http::{FusedClient, Result};
use crate::types::{Identity, LoginResponse, MagicLinkResponse, RegisterResponse};

impl FusedClient {
    /// Start a registration and receive a short-lived code
    ///
    /// POST /fused/register  (email|uuid, appId)
    pub async fn register(&self, identity: &Identity) -> Result<RegisterResponse> {
        let form = [
            (identity.kind().form_field(), identity.subject()),
            ("appId", identity.app_id()),
        ];
        let builder = self.post_form("/fused/register", &form, None, None)?;
        self.send_json(builder).await
    }

    /// Wait for the user to follow the emailed link
    ///
    /// POST /fused/login  (code, appId)
    ///
    /// The server holds this request open until the link is used, so it
    /// runs under `login_timeout` rather than the default timeout.
    pub async fn login(&self, code: &str, app_id: &str) -> Result<LoginResponse> {
        let form = [("code", code), ("appId", app_id)];
        let timeout = self.config().login_timeout;
        let builder = self.post_form("/fused/login", &form, None, Some(timeout))?;
        self.send_json(builder).await
    }

    /// Fetch the magic link for a pending registration
    ///
    /// POST /fused/getMagicLink  (code, appId)
    pub async fn magic_link(&self, code: &str, app_id: &str) -> Result<MagicLinkResponse> {
        let form = [("code", code), ("appId", app_id)];
        let builder = self.post_form("/fused/getMagicLink", &form, None, None)?;
        self.send_json(builder).await
    }
}
