//! Error types for catalog, storage and purchase operations.

use thiserror::Error;

use crate::models::Lamports;
use crate::units::format_sol;

/// Rejected listing input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("price must be greater than zero")]
    NonPositivePrice,

    #[error("invalid price '{0}'")]
    InvalidPrice(String),

    #[error("attribute #{0} has an empty trait name")]
    EmptyTraitType(usize),

    #[error("listing '{0}' already exists")]
    DuplicateId(String),
}

/// Durable store failures. Only surfaced on the write path.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Failed to encode catalog: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failures reported by the purchase collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("Insufficient balance: you have {} SOL, need {} SOL", sol(.available), sol(.needed))]
    InsufficientFunds {
        needed: Lamports,
        available: Lamports,
    },

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Purchase rejected: {0}")]
    Rejected(String),
}

fn sol(amount: &Lamports) -> String {
    format_sol(*amount)
}

/// Errors returned by the catalog manager and the marketplace session.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Listing '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Purchase(#[from] PurchaseError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Bad configuration value read from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
