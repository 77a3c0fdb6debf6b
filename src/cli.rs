use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::services::query::SortOrder;

#[derive(Parser, Debug)]
#[command(name = "nft-mp-catalog")]
#[command(about = "Browse, list and buy NFT marketplace listings")]
pub struct Cli {
    /// Act as this wallet instead of MARKETPLACE_WALLET
    #[arg(long, global = true)]
    pub wallet: Option<String>,

    /// Run without a connected wallet
    #[arg(long, global = true, conflicts_with = "wallet")]
    pub guest: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Search and sort the whole catalog
    Browse {
        /// Case-insensitive text matched against name, description, symbol, mint and seller
        #[arg(short, long, default_value = "")]
        search: String,

        /// price-asc, price-desc, date-new, date-old, name-asc or name-desc
        #[arg(long, default_value = "date-new")]
        sort: SortOrder,

        /// Lowest price in SOL (inclusive)
        #[arg(long)]
        min: Option<String>,

        /// Highest price in SOL (inclusive)
        #[arg(long)]
        max: Option<String>,

        /// Only show verified collections
        #[arg(long)]
        verified: bool,
    },

    /// Listings owned by the connected wallet
    Mine,

    /// List an NFT for sale from the connected wallet
    List {
        #[arg(long)]
        mint: String,

        /// Price in SOL, e.g. 0.75
        #[arg(long)]
        price: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        symbol: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        image: Option<String>,

        /// Repeatable trait=value pair
        #[arg(long = "attr", value_name = "TRAIT=VALUE")]
        attributes: Vec<String>,
    },

    /// List an NFT from a JSON listing form (mint, price, optional metadata)
    ListForm { path: PathBuf },

    /// Remove one of your listings
    Delist { id: String },

    /// Buy a listing with the connected wallet
    Buy { id: String },

    /// Balance of the connected wallet
    Balance,

    /// Request a devnet airdrop for the connected wallet
    Faucet,

    /// Faucet and explorer links for the connected wallet
    Links,
}
