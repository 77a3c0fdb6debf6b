//! Settings read from the environment (and `.env`, loaded in `main`).

use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::ConfigError;
use crate::models::Lamports;
use crate::services::links::Cluster;
use crate::units::parse_sol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    File,
    MongoDb,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "file" => Ok(StoreKind::File),
            "mongodb" | "mongo" => Ok(StoreKind::MongoDb),
            _ => Err("expected memory, file or mongodb".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store: StoreKind,
    pub data_dir: PathBuf,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
    pub cluster: Cluster,
    pub wallet: Option<String>,
    pub seed_demo: bool,
    pub starting_balance: Lamports,
    pub simulate_offline: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let store: StoreKind = parse("MARKETPLACE_STORE", var("MARKETPLACE_STORE", "file"))?;
        let log_level: LevelFilter = parse("MARKETPLACE_LOG_LEVEL", var("MARKETPLACE_LOG_LEVEL", "info"))?;
        let cluster: Cluster = parse("SOLANA_CLUSTER", var("SOLANA_CLUSTER", "devnet"))?;

        let seed_demo = flag("MARKETPLACE_SEED_DEMO", var("MARKETPLACE_SEED_DEMO", "true"))?;
        let simulate_offline = flag(
            "MARKETPLACE_SIMULATE_OFFLINE",
            var("MARKETPLACE_SIMULATE_OFFLINE", "false"),
        )?;

        let balance_value = var("MARKETPLACE_STARTING_BALANCE", "2");
        let starting_balance = parse_sol(&balance_value).map_err(|e| ConfigError::Invalid {
            key: "MARKETPLACE_STARTING_BALANCE",
            value: balance_value.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            store,
            data_dir: PathBuf::from(var("MARKETPLACE_DATA_DIR", "data")),
            mongodb_uri: var("MONGODB_URI", "mongodb://localhost:27017"),
            mongodb_database: var("MONGODB_DATABASE", "nft-mp"),
            log_file: PathBuf::from(var("MARKETPLACE_LOG_FILE", "logs/log.txt")),
            log_level,
            cluster,
            wallet: lookup("MARKETPLACE_WALLET")
                .map(|wallet| wallet.trim().to_string())
                .filter(|wallet| !wallet.is_empty()),
            seed_demo,
            starting_balance,
            simulate_offline,
        })
    }
}

fn parse<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

fn flag(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}
