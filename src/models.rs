use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::ValidationError;
use crate::units::parse_sol;

/// Prices are integer lamports everywhere inside the crate.
pub type Lamports = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub mint: String,
    pub seller: String,
    pub price: Lamports,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub verified: bool,
    pub created_at: i64,
}

impl Listing {
    /// Turn a validated form into a listing owned by `seller`.
    pub fn from_draft(draft: ListingDraft, id: String, seller: String, created_at: i64) -> Self {
        Self {
            id,
            mint: draft.mint,
            seller,
            price: draft.price,
            image: draft.image,
            name: draft.name,
            symbol: draft.symbol,
            description: draft.description,
            attributes: draft.attributes,
            verified: false,
            created_at,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyField("id"));
        }
        if self.mint.trim().is_empty() {
            return Err(ValidationError::EmptyField("mint"));
        }
        if self.seller.trim().is_empty() {
            return Err(ValidationError::EmptyField("seller"));
        }
        if self.price == 0 {
            return Err(ValidationError::NonPositivePrice);
        }
        Ok(())
    }
}

/// A listing form that has passed validation. Only `mint` and `price` are
/// required; the rest is display metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDraft {
    mint: String,
    price: Lamports,
    name: String,
    symbol: String,
    description: String,
    image: String,
    attributes: Vec<Attribute>,
}

impl ListingDraft {
    pub fn new(mint: &str, price: Lamports) -> Result<Self, ValidationError> {
        let mint = mint.trim();
        if mint.is_empty() {
            return Err(ValidationError::EmptyField("mint"));
        }
        if price == 0 {
            return Err(ValidationError::NonPositivePrice);
        }

        Ok(Self {
            mint: mint.to_string(),
            price,
            name: String::new(),
            symbol: String::new(),
            description: String::new(),
            image: String::new(),
            attributes: Vec::new(),
        })
    }

    /// Same as [`ListingDraft::new`] with the price typed in SOL.
    pub fn from_sol(mint: &str, price_sol: &str) -> Result<Self, ValidationError> {
        Self::new(mint, parse_sol(price_sol)?)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn attribute(
        mut self,
        trait_type: &str,
        value: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let trait_type = trait_type.trim();
        if trait_type.is_empty() {
            return Err(ValidationError::EmptyTraitType(self.attributes.len()));
        }
        self.attributes.push(Attribute {
            trait_type: trait_type.to_string(),
            value: value.into(),
        });
        Ok(self)
    }

    pub fn mint(&self) -> &str {
        &self.mint
    }

    pub fn price(&self) -> Lamports {
        self.price
    }
}

/// Raw listing form as submitted by a client. Unknown fields are refused.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListingForm {
    pub mint: String,
    /// Decimal SOL, e.g. "0.75".
    pub price: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl TryFrom<ListingForm> for ListingDraft {
    type Error = ValidationError;

    fn try_from(form: ListingForm) -> Result<Self, Self::Error> {
        let mut draft = ListingDraft::from_sol(&form.mint, &form.price)?
            .name(form.name.unwrap_or_default())
            .symbol(form.symbol.unwrap_or_default())
            .description(form.description.unwrap_or_default())
            .image(form.image.unwrap_or_default());

        for attribute in form.attributes {
            draft = draft.attribute(&attribute.trait_type, attribute.value)?;
        }

        Ok(draft)
    }
}

static ID_SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Opaque listing id: creation time plus a process-local sequence, hex encoded.
pub fn new_listing_id(created_at: i64) -> String {
    let sequence = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);

    let mut bytes = Vec::with_capacity(12);
    bytes.extend_from_slice(&created_at.to_be_bytes());
    bytes.extend_from_slice(&sequence.to_be_bytes());

    hex::encode(bytes)
}

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

/// "9WzD...AWWM" style shortening used when printing addresses.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 8 {
        return address.to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
