/*
[INPUT]:  Authenticated session and chain identifier
[OUTPUT]: Address, balance and holdings for the signed-in wallet
[POS]:    Facade - account queries bound to a session's bearer token
[UPDATE]: When account endpoints are added to the client
*/

use tracing::debug;

use crate::auth::AuthSession;
use crate::http::Result;
use crate::types::{Chain, StringMap};

impl AuthSession {
    /// Wallet address as reported by the service
    ///
    /// [`AuthSession::address`] reads the same value from the token without
    /// a network call.
    pub async fn fetch_address(&self) -> Result<String> {
        let token = self.bearer_token()?;
        self.client().query_account_address(&token).await
    }

    /// Native coin balance, in the chain's smallest unit, as returned
    pub async fn native_balance(&self, chain: Chain) -> Result<String> {
        let token = self.bearer_token()?;
        debug!(%chain, "querying native balance");
        self.client().query_native_balance(&token, chain).await
    }

    pub async fn erc20_tokens(&self, chain: Chain) -> Result<Vec<StringMap>> {
        let token = self.bearer_token()?;
        debug!(%chain, "querying erc20 tokens");
        self.client().query_erc20_tokens(&token, chain).await
    }

    pub async fn nft_tokens(&self, chain: Chain) -> Result<Vec<StringMap>> {
        let token = self.bearer_token()?;
        debug!(%chain, "querying nfts");
        self.client().query_nft_tokens(&token, chain).await
    }
}
