/*
[INPUT]:  Wire identifiers accepted by the account endpoints
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - closed identifier sets
[UPDATE]: When the remote service adds or retires a chain
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Chains the account endpoints understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chain {
    #[serde(rename = "eth")]
    Eth,
    #[serde(rename = "ropsten")]
    Ropsten,
    #[serde(rename = "rinkeby")]
    Rinkeby,
    #[serde(rename = "goerli")]
    Goerli,
    #[serde(rename = "kovan")]
    Kovan,
    #[serde(rename = "polygon")]
    Polygon,
    #[serde(rename = "mumbai")]
    Mumbai,
    #[serde(rename = "bsc")]
    Bsc,
    #[serde(rename = "bsc testnet")]
    BscTestnet,
    #[serde(rename = "avalanche")]
    Avalanche,
    #[serde(rename = "avalanche testnet")]
    AvalancheTestnet,
    #[serde(rename = "fantom")]
    Fantom,
}

impl Chain {
    pub const ALL: [Chain; 12] = [
        Chain::Eth,
        Chain::Ropsten,
        Chain::Rinkeby,
        Chain::Goerli,
        Chain::Kovan,
        Chain::Polygon,
        Chain::Mumbai,
        Chain::Bsc,
        Chain::BscTestnet,
        Chain::Avalanche,
        Chain::AvalancheTestnet,
        Chain::Fantom,
    ];

    /// Identifier sent in the `chain` form field
    pub fn as_wire_str(self) -> &'static str {
        match self {
            Chain::Eth => "eth",
            Chain::Ropsten => "ropsten",
            Chain::Rinkeby => "rinkeby",
            Chain::Goerli => "goerli",
            Chain::Kovan => "kovan",
            Chain::Polygon => "polygon",
            Chain::Mumbai => "mumbai",
            Chain::Bsc => "bsc",
            Chain::BscTestnet => "bsc testnet",
            Chain::Avalanche => "avalanche",
            Chain::AvalancheTestnet => "avalanche testnet",
            Chain::Fantom => "fantom",
        }
    }

    pub fn is_testnet(self) -> bool {
        matches!(
            self,
            Chain::Ropsten
                | Chain::Rinkeby
                | Chain::Goerli
                | Chain::Kovan
                | Chain::Mumbai
                | Chain::BscTestnet
                | Chain::AvalancheTestnet
        )
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

/// Error returned when a string names no known chain
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown chain identifier: {0}")]
pub struct UnknownChain(pub String);

impl FromStr for Chain {
    type Err = UnknownChain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept "bsc-testnet" / "bsc_testnet" as well, handy on a command line.
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        Chain::ALL
            .into_iter()
            .find(|chain| chain.as_wire_str() == normalized)
            .ok_or_else(|| UnknownChain(s.to_string()))
    }
}

/// Which form field carries the subject on registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Email,
    Uuid,
}

impl SubjectKind {
    pub fn form_field(self) -> &'static str {
        match self {
            SubjectKind::Email => "email",
            SubjectKind::Uuid => "uuid",
        }
    }
}
