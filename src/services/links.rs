//! Faucet and block-explorer URL builders. Pure string formatting.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cluster {
    #[default]
    Devnet,
    Mainnet,
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cluster::Devnet => f.write_str("devnet"),
            Cluster::Mainnet => f.write_str("mainnet"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown cluster '{0}', expected devnet or mainnet")]
pub struct ParseClusterError(String);

impl FromStr for Cluster {
    type Err = ParseClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Cluster::Devnet),
            "mainnet" | "mainnet-beta" => Ok(Cluster::Mainnet),
            _ => Err(ParseClusterError(s.to_string())),
        }
    }
}

pub fn faucet_url(address: &str) -> String {
    format!("https://faucet.solana.com/?address={address}&cluster=devnet")
}

pub fn explorer_tx_url(signature: &str, cluster: Cluster) -> String {
    format!("https://explorer.solana.com/tx/{signature}?cluster={cluster}")
}

pub fn explorer_address_url(address: &str, cluster: Cluster) -> String {
    format!("https://explorer.solana.com/address/{address}?cluster={cluster}")
}
