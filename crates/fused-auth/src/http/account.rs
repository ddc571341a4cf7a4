/*
[INPUT]:  Bearer token and chain identifier
[OUTPUT]: Wallet address, native balance, ERC-20 and NFT entries
[POS]:    HTTP layer - account endpoints (require bearer auth)
[UPDATE]: When adding new account endpoints or changing response format
*/

// ### Account Endpoints

use crate::http::{FusedClient, Result};
use crate::types::{AddressResponse, BalanceResponse, Chain, StringMap};

impl FusedClient {
    /// Query the wallet address bound to the token
    ///
    /// POST /account
    pub async fn query_account_address(&self, token: &str) -> Result<String> {
        let builder = self.post_form("/account", &[], Some(token), None)?;
        let resp: AddressResponse = self.send_json(builder).await?;
        Ok(resp.address)
    }

    /// Query native coin balance
    ///
    /// POST /account/balance  (chain)
    pub async fn query_native_balance(&self, token: &str, chain: Chain) -> Result<String> {
        let form = [("chain", chain.as_wire_str())];
        let builder = self.post_form("/account/balance", &form, Some(token), None)?;
        let resp: BalanceResponse = self.send_json(builder).await?;
        Ok(resp.balance)
    }

    /// Query ERC-20 holdings
    ///
    /// POST /account/erc20  (chain)
    pub async fn query_erc20_tokens(&self, token: &str, chain: Chain) -> Result<Vec<StringMap>> {
        let form = [("chain", chain.as_wire_str())];
        let builder = self.post_form("/account/erc20", &form, Some(token), None)?;
        self.send_json(builder).await
    }

    /// Query NFT holdings
    ///
    /// POST /account/nfts  (chain)
    pub async fn query_nft_tokens(&self, token: &str, chain: Chain) -> Result<Vec<StringMap>> {
        let form = [("chain", chain.as_wire_str())];
        let builder = self.post_form("/account/nfts", &form, Some(token), None)?;
        self.send_json(builder).await
    }
}
