//! Page-level marketplace actions for one connected wallet.

use log::{debug, error, info};

use crate::errors::{CatalogError, Result};
use crate::models::{new_listing_id, now_millis, Lamports, Listing, ListingDraft};
use crate::services::catalog::CatalogManager;
use crate::services::identity::IdentityProvider;
use crate::services::purchase::{PurchaseExecutor, PurchaseReceipt};
use crate::services::query::{ListingFilter, SortOrder};

pub mod marketplace {
    use super::*;

    pub struct Marketplace<I, P> {
        catalog: CatalogManager,
        identity: I,
        executor: P,
    }

    impl<I: IdentityProvider, P: PurchaseExecutor> Marketplace<I, P> {
        pub fn new(catalog: CatalogManager, identity: I, executor: P) -> Self {
            Self {
                catalog,
                identity,
                executor,
            }
        }

        pub fn catalog(&self) -> &CatalogManager {
            &self.catalog
        }

        pub fn identity(&self) -> &I {
            &self.identity
        }

        pub fn identity_mut(&mut self) -> &mut I {
            &mut self.identity
        }

        pub fn executor(&self) -> &P {
            &self.executor
        }

        fn wallet(&self) -> Result<String> {
            self.identity
                .current_identity()
                .ok_or_else(|| CatalogError::Authorization("no wallet connected".to_string()))
        }

        pub fn browse(&self, filter: &ListingFilter, sort: SortOrder) -> Vec<Listing> {
            self.catalog.query(filter, sort)
        }

        /// Empty when no wallet is connected.
        pub fn my_listings(&self) -> Vec<Listing> {
            match self.identity.current_identity() {
                Some(wallet) => self.catalog.by_owner(&wallet),
                None => Vec::new(),
            }
        }

        pub async fn list(&mut self, draft: ListingDraft) -> Result<Listing> {
            let seller = self.wallet()?;
            debug!(
                "Listing {} for {} lamports from {}",
                draft.mint(),
                draft.price(),
                seller
            );

            let created_at = now_millis();
            let listing = Listing::from_draft(draft, new_listing_id(created_at), seller, created_at);

            self.catalog
                .add(listing.clone(), self.identity.current_identity().as_deref())
                .await?;
            Ok(listing)
        }

        pub async fn delist(&mut self, id: &str) -> Result<Listing> {
            let wallet = self.identity.current_identity();
            self.catalog.remove(id, wallet.as_deref()).await
        }

        /// Pay for a listing, then drop it from the catalog. A failed payment
        /// leaves the catalog as it was.
        pub async fn buy(&mut self, id: &str) -> Result<PurchaseReceipt> {
            let buyer = self.wallet()?;
            let listing = self
                .catalog
                .get(id)
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

            let receipt = self
                .executor
                .purchase(&buyer, &listing.seller, &listing.mint, listing.price)
                .await?;

            if let Err(err) = self.catalog.remove_sold(id, &receipt).await {
                error!(
                    "Purchase {} settled but listing {} is still stored: {}",
                    receipt.reference_id, id, err
                );
                return Err(err);
            }

            Ok(receipt)
        }

        pub async fn balance(&self) -> Result<Lamports> {
            let wallet = self.wallet()?;
            Ok(self.executor.balance(&wallet).await?)
        }

        pub async fn airdrop(&self) -> Result<String> {
            let wallet = self.wallet()?;
            let reference = self.executor.request_airdrop(&wallet).await?;
            info!("Airdrop requested for {}", wallet);
            Ok(reference)
        }
    }
}
