use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The ledger network a client talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Lowercase network name as used in URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }

    /// Default public fullnode JSON-RPC endpoint.
    pub fn fullnode_url(&self) -> &'static str {
        match self {
            Self::Mainnet => "https://fullnode.mainnet.sui.io:443",
            Self::Testnet => "https://fullnode.testnet.sui.io:443",
        }
    }

    /// Explorer page for a blob.
    pub fn explorer_blob_url(&self, blob_id: &str) -> String {
        format!("https://walruscan.com/{}/blob/{blob_id}", self.as_str())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "sui:mainnet" => Ok(Self::Mainnet),
            "testnet" | "sui:testnet" => Ok(Self::Testnet),
            other => Err(TypeError::UnknownNetwork(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explorer_url() {
        assert_eq!(
            Network::Mainnet.explorer_blob_url("abc"),
            "https://walruscan.com/mainnet/blob/abc"
        );
        assert_eq!(
            Network::Testnet.explorer_blob_url("abc"),
            "https://walruscan.com/testnet/blob/abc"
        );
    }

    #[test]
    fn parse() {
        assert_eq!("Mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("sui:testnet".parse::<Network>().unwrap(), Network::Testnet);
        assert!("devnet".parse::<Network>().is_err());
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&Network::Testnet).unwrap();
        assert_eq!(json, "\"testnet\"");
    }
}
