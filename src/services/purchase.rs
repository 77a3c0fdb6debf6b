//! Value transfer for purchases.
//!
//! The catalog never moves funds itself. It hands a purchase to a
//! [`PurchaseExecutor`] and only drops the listing once a successful
//! [`PurchaseReceipt`] comes back.

use futures::future::{BoxFuture, FutureExt};
use log::{info, warn};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::errors::PurchaseError;
use crate::models::{now_millis, short_address, Lamports};
use crate::services::links::{explorer_tx_url, Cluster};
use crate::services::storage::KeyValueStore;
use crate::units::{format_sol, LAMPORTS_PER_SOL};

/// Amount credited by one faucet request.
pub const AIRDROP_LAMPORTS: Lamports = 2 * LAMPORTS_PER_SOL;

pub const LEDGER_KEY: &str = "nft-marketplace.ledger";

type Balances = BTreeMap<String, Lamports>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub success: bool,
    pub reference_id: String,
    pub explorer_url: String,
    pub buyer: String,
    pub seller: String,
    pub mint: String,
    pub price: Lamports,
}

pub trait PurchaseExecutor: Send + Sync {
    fn purchase<'a>(
        &'a self,
        buyer: &'a str,
        seller: &'a str,
        mint: &'a str,
        price: Lamports,
    ) -> BoxFuture<'a, Result<PurchaseReceipt, PurchaseError>>;

    fn balance<'a>(&'a self, owner: &'a str) -> BoxFuture<'a, Result<Lamports, PurchaseError>>;

    fn request_airdrop<'a>(&'a self, owner: &'a str) -> BoxFuture<'a, Result<String, PurchaseError>>;
}

fn ledger_unavailable(err: impl Display) -> PurchaseError {
    PurchaseError::NetworkFailure(format!("ledger store: {err}"))
}

/// Lamport ledger standing in for the network.
///
/// Balances are kept as one JSON object under [`LEDGER_KEY`] in the same
/// store as the catalog, so they outlive the process. Every mutation is a
/// read-modify-write of that object, serialized by `writes`.
pub struct SimulatedLedger {
    cluster: Cluster,
    store: Arc<dyn KeyValueStore>,
    writes: Mutex<()>,
    offline: AtomicBool,
    sequence: AtomicU64,
}

impl SimulatedLedger {
    pub fn new(cluster: Cluster, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            cluster,
            store,
            writes: Mutex::new(()),
            offline: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
        }
    }

    pub async fn credit(&self, owner: &str, amount: Lamports) -> Result<Lamports, PurchaseError> {
        let _guard = self.writes.lock().await;

        let mut balances = self.read_balances().await?;
        let balance = balances.entry(owner.to_string()).or_default();
        *balance = balance.saturating_add(amount);
        let balance = *balance;

        self.write_balances(&balances).await?;
        Ok(balance)
    }

    /// Give `owner` a starting balance the first time the ledger sees them.
    /// Returns false when the account already existed.
    pub async fn open_account(&self, owner: &str, starting: Lamports) -> Result<bool, PurchaseError> {
        let _guard = self.writes.lock().await;

        let mut balances = self.read_balances().await?;
        if balances.contains_key(owner) {
            return Ok(false);
        }
        balances.insert(owner.to_string(), starting);

        self.write_balances(&balances).await?;
        info!(
            "Opened account {} with {} SOL",
            short_address(owner),
            format_sol(starting)
        );
        Ok(true)
    }

    /// While offline every executor call fails with `NetworkFailure`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), PurchaseError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PurchaseError::NetworkFailure(format!(
                "{} RPC endpoint unreachable",
                self.cluster
            )));
        }
        Ok(())
    }

    async fn read_balances(&self) -> Result<Balances, PurchaseError> {
        match self.store.get(LEDGER_KEY).await.map_err(ledger_unavailable)? {
            Some(raw) => serde_json::from_str(&raw).map_err(ledger_unavailable),
            None => Ok(Balances::new()),
        }
    }

    async fn write_balances(&self, balances: &Balances) -> Result<(), PurchaseError> {
        let encoded = serde_json::to_string(balances).map_err(ledger_unavailable)?;
        self.store
            .set(LEDGER_KEY, encoded)
            .await
            .map_err(ledger_unavailable)
    }

    fn next_reference(&self) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);

        let mut bytes = Vec::with_capacity(16);
        bytes.extend_from_slice(&now_millis().to_be_bytes());
        bytes.extend_from_slice(&sequence.to_be_bytes());

        hex::encode(bytes)
    }

    async fn transfer(
        &self,
        buyer: &str,
        seller: &str,
        mint: &str,
        price: Lamports,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        self.ensure_online()?;

        if buyer.trim().is_empty() {
            return Err(PurchaseError::Rejected("wallet not connected".to_string()));
        }
        if buyer == seller {
            return Err(PurchaseError::Rejected(
                "buyer and seller are the same wallet".to_string(),
            ));
        }
        if price == 0 {
            return Err(PurchaseError::Rejected("price must be positive".to_string()));
        }

        let _guard = self.writes.lock().await;
        let mut balances = self.read_balances().await?;
        let available = balances.get(buyer).copied().unwrap_or_default();
        if available < price {
            return Err(PurchaseError::InsufficientFunds {
                needed: price,
                available,
            });
        }

        balances.insert(buyer.to_string(), available - price);
        let seller_balance = balances.entry(seller.to_string()).or_default();
        *seller_balance = seller_balance.saturating_add(price);
        self.write_balances(&balances).await?;

        let reference_id = self.next_reference();

        Ok(PurchaseReceipt {
            success: true,
            explorer_url: explorer_tx_url(&reference_id, self.cluster),
            reference_id,
            buyer: buyer.to_string(),
            seller: seller.to_string(),
            mint: mint.to_string(),
            price,
        })
    }
}

impl PurchaseExecutor for SimulatedLedger {
    fn purchase<'a>(
        &'a self,
        buyer: &'a str,
        seller: &'a str,
        mint: &'a str,
        price: Lamports,
    ) -> BoxFuture<'a, Result<PurchaseReceipt, PurchaseError>> {
        async move {
            info!(
                "Purchase of {} for {} SOL from {} by {}",
                mint,
                format_sol(price),
                seller,
                buyer
            );

            match self.transfer(buyer, seller, mint, price).await {
                Ok(receipt) => {
                    info!("Purchase confirmed: {}", receipt.reference_id);
                    Ok(receipt)
                }
                Err(err) => {
                    warn!("Purchase of {} failed: {}", mint, err);
                    Err(err)
                }
            }
        }
        .boxed()
    }

    fn balance<'a>(&'a self, owner: &'a str) -> BoxFuture<'a, Result<Lamports, PurchaseError>> {
        async move {
            self.ensure_online()?;
            let balances = self.read_balances().await?;
            Ok(balances.get(owner).copied().unwrap_or_default())
        }
        .boxed()
    }

    fn request_airdrop<'a>(&'a self, owner: &'a str) -> BoxFuture<'a, Result<String, PurchaseError>> {
        async move {
            self.ensure_online()?;
            self.credit(owner, AIRDROP_LAMPORTS).await?;

            let reference_id = self.next_reference();
            info!(
                "Airdrop of {} SOL to {}: {}",
                format_sol(AIRDROP_LAMPORTS),
                owner,
                reference_id
            );
            Ok(reference_id)
        }
        .boxed()
    }
}
