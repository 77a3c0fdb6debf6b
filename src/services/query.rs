use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::models::{Lamports, Listing};

/// Search and narrowing criteria for browsing the catalog.
///
/// An empty `search` matches everything. Price bounds are inclusive and in
/// lamports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub search: String,
    pub min_price: Option<Lamports>,
    pub max_price: Option<Lamports>,
    pub verified_only: bool,
    pub seller: Option<String>,
}

impl ListingFilter {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: term.into(),
            ..Self::default()
        }
    }

    pub fn by_seller(seller: impl Into<String>) -> Self {
        Self {
            seller: Some(seller.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        self.matches_search(listing, &self.search.to_lowercase())
            && self.matches_price(listing.price)
            && (!self.verified_only || listing.verified)
            && self
                .seller
                .as_ref()
                .map_or(true, |seller| &listing.seller == seller)
    }

    fn matches_search(&self, listing: &Listing, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }

        [
            &listing.name,
            &listing.description,
            &listing.symbol,
            &listing.mint,
            &listing.seller,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }

    fn matches_price(&self, price: Lamports) -> bool {
        self.min_price.map_or(true, |min| price >= min)
            && self.max_price.map_or(true, |max| price <= max)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
    #[default]
    DateNew,
    DateOld,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    pub fn compare(self, a: &Listing, b: &Listing) -> Ordering {
        match self {
            SortOrder::PriceAsc => a.price.cmp(&b.price),
            SortOrder::PriceDesc => b.price.cmp(&a.price),
            SortOrder::DateNew => b.created_at.cmp(&a.created_at),
            SortOrder::DateOld => a.created_at.cmp(&b.created_at),
            SortOrder::NameAsc => a.name.cmp(&b.name),
            SortOrder::NameDesc => b.name.cmp(&a.name),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            SortOrder::PriceAsc => "price-asc",
            SortOrder::PriceDesc => "price-desc",
            SortOrder::DateNew => "date-new",
            SortOrder::DateOld => "date-old",
            SortOrder::NameAsc => "name-asc",
            SortOrder::NameDesc => "name-desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort order '{0}', expected one of price-asc, price-desc, date-new, date-old, name-asc, name-desc")]
pub struct ParseSortOrderError(String);

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price-asc" => Ok(SortOrder::PriceAsc),
            "price-desc" => Ok(SortOrder::PriceDesc),
            "date-new" => Ok(SortOrder::DateNew),
            "date-old" => Ok(SortOrder::DateOld),
            "name-asc" => Ok(SortOrder::NameAsc),
            "name-desc" => Ok(SortOrder::NameDesc),
            _ => Err(ParseSortOrderError(s.to_string())),
        }
    }
}

/// Filter then stable-sort. Equal keys keep their catalog order.
pub fn apply(listings: &[Listing], filter: &ListingFilter, sort: SortOrder) -> Vec<Listing> {
    let mut selected: Vec<Listing> = listings
        .iter()
        .filter(|listing| filter.matches(listing))
        .cloned()
        .collect();

    selected.sort_by(|a, b| sort.compare(a, b));
    selected
}
