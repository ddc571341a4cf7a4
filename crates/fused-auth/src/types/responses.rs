/*
[INPUT]:  JSON bodies returned by the remote auth service
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - wire response shapes
[UPDATE]: When an endpoint's response schema changes
*/

use serde::{Deserialize, Serialize};

/// POST /fused/register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub code: String,
}

/// POST /fused/login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// POST /fused/getMagicLink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagicLinkResponse {
    #[serde(rename = "magicLink")]
    pub magic_link: String,
}

/// POST /account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressResponse {
    pub address: String,
}

/// POST /account/balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: String,
}
