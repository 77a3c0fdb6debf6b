//! The listing catalog: single source of truth for active listings.
//!
//! Every mutation rewrites the whole collection under [`LISTINGS_KEY`]. Two
//! managers sharing one store therefore race with last-write-wins; a single
//! manager serializes its own writes through `&mut self`.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::{CatalogError, Result, StorageError, ValidationError};
use crate::models::{Listing, short_address};
use crate::services::purchase::PurchaseReceipt;
use crate::services::query::{self, ListingFilter, SortOrder};
use crate::services::storage::KeyValueStore;
use crate::units::format_sol;

pub const LISTINGS_KEY: &str = "nft-marketplace.listings";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct StoredCatalogRef<'a> {
    version: u32,
    listings: &'a [Listing],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCatalog {
    Versioned { version: u32, listings: Vec<Listing> },
    Legacy(Vec<Listing>),
}

fn encode(listings: &[Listing]) -> std::result::Result<String, StorageError> {
    Ok(serde_json::to_string(&StoredCatalogRef {
        version: SCHEMA_VERSION,
        listings,
    })?)
}

/// Decode a stored collection, dropping records that break listing invariants.
fn decode(raw: &str) -> std::result::Result<Vec<Listing>, String> {
    let listings = match serde_json::from_str::<StoredCatalog>(raw).map_err(|e| e.to_string())? {
        StoredCatalog::Versioned { version, listings } if version == SCHEMA_VERSION => listings,
        StoredCatalog::Versioned { version, .. } => {
            return Err(format!("unsupported schema version {version}"));
        }
        StoredCatalog::Legacy(listings) => listings,
    };

    let mut seen = HashSet::new();
    let mut valid = Vec::with_capacity(listings.len());
    for listing in listings {
        if let Err(err) = listing.validate() {
            warn!("Skipping stored listing '{}': {}", listing.id, err);
            continue;
        }
        if !seen.insert(listing.id.clone()) {
            warn!("Skipping duplicate stored listing '{}'", listing.id);
            continue;
        }
        valid.push(listing);
    }

    Ok(valid)
}

fn require_identity(requestor: Option<&str>) -> Result<&str> {
    match requestor.map(str::trim) {
        Some(identity) if !identity.is_empty() => Ok(identity),
        _ => Err(CatalogError::Authorization(
            "no wallet connected".to_string(),
        )),
    }
}

pub struct CatalogManager {
    store: Arc<dyn KeyValueStore>,
    listings: Vec<Listing>,
    /// Set only when the last load found no stored collection at all.
    never_written: bool,
}

impl CatalogManager {
    /// Manager with an empty snapshot. Call [`CatalogManager::load_all`] to
    /// pick up persisted data.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            listings: Vec::new(),
            never_written: false,
        }
    }

    pub async fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let mut manager = Self::new(store);
        manager.load_all().await;
        manager
    }

    /// Reload from the store. Missing, unreadable or corrupt data yields an
    /// empty catalog; the failure is only logged.
    pub async fn load_all(&mut self) -> Vec<Listing> {
        let stored = self.store.get(LISTINGS_KEY).await;
        self.never_written = matches!(stored, Ok(None));

        self.listings = match stored {
            Ok(Some(raw)) => decode(&raw).unwrap_or_else(|reason| {
                warn!("Stored listings unreadable, starting empty: {}", reason);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Failed to read listings, starting empty: {}", err);
                Vec::new()
            }
        };

        self.listings.clone()
    }

    /// Load demo listings into a store that has never held a collection.
    /// An emptied collection, an unreadable one or a failed read is left
    /// alone. Returns how many were added.
    pub async fn seed(&mut self, listings: Vec<Listing>) -> Result<usize> {
        if !self.never_written {
            return Ok(0);
        }

        let mut seen = HashSet::new();
        for listing in &listings {
            listing.validate()?;
            if !seen.insert(listing.id.as_str()) {
                return Err(ValidationError::DuplicateId(listing.id.clone()).into());
            }
        }

        self.commit(listings).await?;
        info!("Seeded {} demo listings", self.listings.len());
        Ok(self.listings.len())
    }

    /// Insert at the head. `requestor` must be the listing's seller.
    pub async fn add(&mut self, listing: Listing, requestor: Option<&str>) -> Result<()> {
        let requestor = require_identity(requestor)?;

        listing.validate()?;
        if listing.seller != requestor {
            return Err(CatalogError::Authorization(format!(
                "{} cannot list on behalf of {}",
                short_address(requestor),
                short_address(&listing.seller)
            )));
        }
        if self.get(&listing.id).is_some() {
            return Err(ValidationError::DuplicateId(listing.id).into());
        }

        let output = format!(
            "Item {} listed for {} SOL by {}",
            listing.id,
            format_sol(listing.price),
            short_address(&listing.seller)
        );

        let mut next = Vec::with_capacity(self.listings.len() + 1);
        next.push(listing);
        next.extend(self.listings.iter().cloned());
        self.commit(next).await?;

        info!("{}", output);
        Ok(())
    }

    /// Delist. Only the seller may remove their listing.
    pub async fn remove(&mut self, id: &str, requestor: Option<&str>) -> Result<Listing> {
        let requestor = require_identity(requestor)?;

        let listing = self
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        if listing.seller != requestor {
            return Err(CatalogError::Authorization(format!(
                "listing '{}' belongs to {}",
                id,
                short_address(&listing.seller)
            )));
        }

        let removed = self.take(id).await?;
        info!("Item {} delisted by {}", id, short_address(requestor));
        Ok(removed)
    }

    /// Drop a listing that a confirmed purchase has paid for. The receipt
    /// must be successful and name the listing's seller, mint and price.
    pub async fn remove_sold(&mut self, id: &str, receipt: &PurchaseReceipt) -> Result<Listing> {
        let listing = self
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        let paid_for = receipt.success
            && receipt.seller == listing.seller
            && receipt.mint == listing.mint
            && receipt.price == listing.price;
        if !paid_for {
            return Err(CatalogError::Authorization(format!(
                "receipt {} does not settle listing '{}'",
                receipt.reference_id, id
            )));
        }

        let removed = self.take(id).await?;
        info!(
            "Item {} sold to {} ({})",
            id,
            short_address(&receipt.buyer),
            receipt.reference_id
        );
        Ok(removed)
    }

    pub fn query(&self, filter: &ListingFilter, sort: SortOrder) -> Vec<Listing> {
        query::apply(&self.listings, filter, sort)
    }

    pub fn by_owner(&self, identity: &str) -> Vec<Listing> {
        self.query(&ListingFilter::by_seller(identity), SortOrder::DateNew)
    }

    pub fn get(&self, id: &str) -> Option<&Listing> {
        self.listings.iter().find(|listing| listing.id == id)
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    async fn take(&mut self, id: &str) -> Result<Listing> {
        let position = self
            .listings
            .iter()
            .position(|listing| listing.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        let mut next = self.listings.clone();
        let removed = next.remove(position);
        self.commit(next).await?;
        Ok(removed)
    }

    /// Persist `next` as the full collection; the snapshot only changes once
    /// the write succeeded.
    async fn commit(&mut self, next: Vec<Listing>) -> Result<()> {
        let encoded = encode(&next)?;
        self.store.set(LISTINGS_KEY, encoded).await?;
        self.listings = next;
        self.never_written = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Lamports;
    use crate::services::storage::testing::{FlakyReadStore, ReadOnlyStore};
    use crate::services::storage::MemoryStore;

    const ALICE: &str = "AliceWallet1111111111111111111111111111111";
    const BOB: &str = "BobWallet22222222222222222222222222222222";

    fn listing(id: &str, seller: &str, price: Lamports, created_at: i64) -> Listing {
        Listing {
            id: id.to_string(),
            mint: format!("mint-{id}"),
            seller: seller.to_string(),
            price,
            image: String::new(),
            name: format!("Item {id}"),
            symbol: "ITEM".to_string(),
            description: String::new(),
            attributes: Vec::new(),
            verified: false,
            created_at,
        }
    }

    fn receipt_for(listing: &Listing, buyer: &str) -> PurchaseReceipt {
        PurchaseReceipt {
            success: true,
            reference_id: "ref-1".to_string(),
            explorer_url: String::new(),
            buyer: buyer.to_string(),
            seller: listing.seller.clone(),
            mint: listing.mint.clone(),
            price: listing.price,
        }
    }

    async fn stored_raw(store: &Arc<MemoryStore>) -> Option<String> {
        store.get(LISTINGS_KEY).await.unwrap()
    }

    #[tokio::test]
    async fn add_then_load_all_round_trips() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = CatalogManager::open(store.clone()).await;

        let item = listing("a", ALICE, 500_000_000, 10);
        catalog.add(item.clone(), Some(ALICE)).await.unwrap();

        let loaded = catalog.load_all().await;
        assert_eq!(loaded.iter().filter(|l| **l == item).count(), 1);
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn add_inserts_most_recent_first() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = CatalogManager::open(store).await;

        catalog.add(listing("a", ALICE, 1, 1), Some(ALICE)).await.unwrap();
        catalog.add(listing("b", ALICE, 1, 2), Some(ALICE)).await.unwrap();

        let ids: Vec<String> = catalog.load_all().await.into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn zero_price_is_rejected_and_store_untouched() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = CatalogManager::open(store.clone()).await;

        let err = catalog
            .add(listing("a", ALICE, 0, 1), Some(ALICE))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::NonPositivePrice)
        ));
        assert_eq!(stored_raw(&store).await, None);
        assert!(catalog.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn add_requires_matching_identity() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = CatalogManager::open(store).await;

        let err = catalog.add(listing("a", ALICE, 1, 1), None).await.unwrap_err();
        assert!(matches!(err, CatalogError::Authorization(_)));

        let err = catalog
            .add(listing("a", ALICE, 1, 1), Some(BOB))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Authorization(_)));
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = CatalogManager::open(store).await;

        catalog.add(listing("a", ALICE, 1, 1), Some(ALICE)).await.unwrap();
        let err = catalog
            .add(listing("a", ALICE, 2, 2), Some(ALICE))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::DuplicateId(_))
        ));
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test]
    async fn remove_by_non_owner_changes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = CatalogManager::open(store.clone()).await;
        catalog.add(listing("a", ALICE, 1, 1), Some(ALICE)).await.unwrap();
        let before = stored_raw(&store).await;

        let err = catalog.remove("a", Some(BOB)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Authorization(_)));

        let err = catalog.remove("a", None).await.unwrap_err();
        assert!(matches!(err, CatalogError::Authorization(_)));

        assert_eq!(stored_raw(&store).await, before);
        assert_eq!(catalog.load_all().await.len(), 1);
    }

    #[tokio::test]
    async fn owner_removes_listing() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = CatalogManager::open(store).await;
        catalog.add(listing("a", ALICE, 1, 1), Some(ALICE)).await.unwrap();
        catalog.add(listing("b", ALICE, 1, 2), Some(ALICE)).await.unwrap();

        let removed = catalog.remove("a", Some(ALICE)).await.unwrap();
        assert_eq!(removed.id, "a");

        let err = catalog.remove("a", Some(ALICE)).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));

        let ids: Vec<String> = catalog.load_all().await.into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test]
    async fn reopening_returns_the_same_set() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = CatalogManager::open(store.clone()).await;
        for (i, seller) in [ALICE, BOB, ALICE].iter().enumerate() {
            let id = format!("l{i}");
            catalog
                .add(listing(&id, seller, 100 + i as u64, i as i64), Some(*seller))
                .await
                .unwrap();
        }
        let mut before = catalog.load_all().await;

        let mut reopened = CatalogManager::open(store).await;
        let mut after = reopened.load_all().await;

        before.sort_by(|a, b| a.id.cmp(&b.id));
        after.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn malformed_data_loads_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(LISTINGS_KEY, "{not json at all".to_string())
            .await
            .unwrap();

        let mut catalog = CatalogManager::open(store).await;
        assert!(catalog.load_all().await.is_empty());
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn unknown_schema_version_loads_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                LISTINGS_KEY,
                r#"{"version": 99, "listings": []}"#.to_string(),
            )
            .await
            .unwrap();

        let catalog = CatalogManager::open(store).await;
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn legacy_array_is_read_and_upgraded_on_write() {
        let store = Arc::new(MemoryStore::new());
        let legacy = serde_json::to_string(&vec![listing("old", ALICE, 7, 1)]).unwrap();
        store.set(LISTINGS_KEY, legacy).await.unwrap();

        let mut catalog = CatalogManager::open(store.clone()).await;
        assert_eq!(catalog.len(), 1);

        catalog.add(listing("new", ALICE, 8, 2), Some(ALICE)).await.unwrap();
        let raw = stored_raw(&store).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], SCHEMA_VERSION);
        assert_eq!(value["listings"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn invalid_stored_records_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        let raw = serde_json::json!({
            "version": 1,
            "listings": [listing("ok", ALICE, 5, 1), listing("free", ALICE, 0, 2), listing("ok", BOB, 5, 3)]
        });
        store.set(LISTINGS_KEY, raw.to_string()).await.unwrap();

        let catalog = CatalogManager::open(store).await;
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("ok").unwrap().seller, ALICE);
    }

    #[tokio::test]
    async fn failed_write_surfaces_and_keeps_snapshot() {
        let store = Arc::new(ReadOnlyStore::default());
        let seeded = serde_json::to_string(&vec![listing("a", ALICE, 1, 1)]).unwrap();
        store.inner.set(LISTINGS_KEY, seeded).await.unwrap();

        let mut catalog = CatalogManager::open(store).await;
        assert_eq!(catalog.len(), 1);

        let err = catalog
            .add(listing("b", ALICE, 1, 2), Some(ALICE))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Storage(_)));
        assert_eq!(catalog.len(), 1);

        let err = catalog.remove("a", Some(ALICE)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Storage(_)));
        assert!(catalog.get("a").is_some());
    }

    #[tokio::test]
    async fn by_owner_only_returns_own_listings_newest_first() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = CatalogManager::open(store).await;
        catalog.add(listing("a1", ALICE, 1, 1), Some(ALICE)).await.unwrap();
        catalog.add(listing("b1", BOB, 1, 2), Some(BOB)).await.unwrap();
        catalog.add(listing("a2", ALICE, 1, 3), Some(ALICE)).await.unwrap();

        let ids: Vec<String> = catalog.by_owner(ALICE).into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["a2", "a1"]);
        assert!(catalog.by_owner("nobody").is_empty());
    }

    #[tokio::test]
    async fn query_sorts_scenario_prices() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = CatalogManager::open(store).await;
        for (id, price) in [("x", "0.5"), ("y", "2.0"), ("z", "1.2")] {
            let price = crate::units::parse_sol(price).unwrap();
            catalog.add(listing(id, ALICE, price, 1), Some(ALICE)).await.unwrap();
        }

        let prices = |sort| -> Vec<String> {
            catalog
                .query(&ListingFilter::default(), sort)
                .iter()
                .map(|l| format_sol(l.price))
                .collect()
        };
        assert_eq!(prices(SortOrder::PriceAsc), vec!["0.5000", "1.2000", "2.0000"]);
        assert_eq!(prices(SortOrder::PriceDesc), vec!["2.0000", "1.2000", "0.5000"]);
    }

    #[tokio::test]
    async fn seed_only_fills_an_empty_catalog() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = CatalogManager::open(store.clone()).await;

        let demo = vec![listing("d1", BOB, 1, 1), listing("d2", BOB, 2, 2)];
        assert_eq!(catalog.seed(demo.clone()).await.unwrap(), 2);
        assert_eq!(catalog.seed(demo).await.unwrap(), 0);

        let reopened = CatalogManager::open(store).await;
        assert_eq!(reopened.len(), 2);
    }

    #[tokio::test]
    async fn seed_never_overwrites_a_collection_it_could_not_read() {
        let store = Arc::new(FlakyReadStore::default());
        let mut catalog = CatalogManager::open(store.clone()).await;
        catalog
            .add(listing("user-listing", ALICE, 5, 1), Some(ALICE))
            .await
            .unwrap();

        store.fail_reads(true);
        let mut restarted = CatalogManager::open(store.clone()).await;
        assert!(restarted.is_empty());
        assert_eq!(restarted.seed(vec![listing("demo", BOB, 1, 1)]).await.unwrap(), 0);

        store.fail_reads(false);
        let recovered = CatalogManager::open(store).await;
        let ids: Vec<&str> = recovered.listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["user-listing"]);
    }

    #[tokio::test]
    async fn seed_skips_corrupt_stored_data() {
        let store = Arc::new(MemoryStore::new());
        store.set(LISTINGS_KEY, "{broken".to_string()).await.unwrap();

        let mut catalog = CatalogManager::open(store.clone()).await;
        assert_eq!(catalog.seed(vec![listing("demo", BOB, 1, 1)]).await.unwrap(), 0);
        assert_eq!(stored_raw(&store).await.as_deref(), Some("{broken"));
    }

    #[tokio::test]
    async fn emptied_catalog_is_not_reseeded() {
        let store = Arc::new(MemoryStore::new());
        let demo = vec![listing("demo", BOB, 1, 1)];

        let mut catalog = CatalogManager::open(store.clone()).await;
        assert_eq!(catalog.seed(demo.clone()).await.unwrap(), 1);
        catalog.remove("demo", Some(BOB)).await.unwrap();

        let mut reopened = CatalogManager::open(store).await;
        assert_eq!(reopened.seed(demo).await.unwrap(), 0);
        assert!(reopened.is_empty());
    }

    #[tokio::test]
    async fn seed_rejects_duplicate_ids() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = CatalogManager::open(store).await;

        let demo = vec![listing("d1", BOB, 1, 1), listing("d1", BOB, 2, 2)];
        let err = catalog.seed(demo).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::DuplicateId(_))
        ));
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn remove_sold_needs_a_matching_receipt() {
        let store = Arc::new(MemoryStore::new());
        let mut catalog = CatalogManager::open(store).await;
        let item = listing("a", ALICE, 10, 1);
        catalog.add(item.clone(), Some(ALICE)).await.unwrap();

        let mut wrong_price = receipt_for(&item, BOB);
        wrong_price.price = 9;
        let err = catalog.remove_sold("a", &wrong_price).await.unwrap_err();
        assert!(matches!(err, CatalogError::Authorization(_)));

        let mut wrong_seller = receipt_for(&item, BOB);
        wrong_seller.seller = BOB.to_string();
        assert!(catalog.remove_sold("a", &wrong_seller).await.is_err());

        let mut wrong_mint = receipt_for(&item, BOB);
        wrong_mint.mint = "mint-other".to_string();
        assert!(catalog.remove_sold("a", &wrong_mint).await.is_err());

        let mut failed = receipt_for(&item, BOB);
        failed.success = false;
        assert!(catalog.remove_sold("a", &failed).await.is_err());
        assert_eq!(catalog.len(), 1);

        let removed = catalog.remove_sold("a", &receipt_for(&item, BOB)).await.unwrap();
        assert_eq!(removed, item);
        assert!(catalog.is_empty());
    }
}
