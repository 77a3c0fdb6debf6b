use std::sync::Arc;

use clap::Parser;
use eyre::{eyre, Result};
use log::info;

mod cli;
mod config;
mod errors;
mod models;
mod units;

mod services {
    pub mod catalog;
    pub mod data_loader;
    pub mod identity;
    pub mod links;
    pub mod logging;
    pub mod purchase;
    pub mod query;
    pub mod session;
    pub mod storage;
}

use cli::{Cli, Command};
use config::{Config, StoreKind};
use models::{now_millis, short_address, Listing, ListingDraft, ListingForm};
use services::catalog::CatalogManager;
use services::data_loader::initial_data::demo_listings;
use services::identity::{IdentityProvider, WalletSession};
use services::links::{explorer_address_url, faucet_url};
use services::logging::logger;
use services::purchase::SimulatedLedger;
use services::query::ListingFilter;
use services::session::marketplace::Marketplace;
use services::storage::{FileStore, KeyValueStore, MemoryStore, MongoStore};
use units::{format_sol, parse_sol};

type Market = Marketplace<WalletSession, SimulatedLedger>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    logger::init(&config.log_file, config.log_level)?;

    let store = open_store(&config).await?;
    let mut catalog = CatalogManager::open(store.clone()).await;

    if config.seed_demo {
        catalog.seed(demo_listings(now_millis())).await?;
    }

    let ledger = SimulatedLedger::new(config.cluster, store);
    ledger.set_offline(config.simulate_offline);

    let wallet = WalletSession::from(config.wallet.clone());
    let mut market = Marketplace::new(catalog, wallet, ledger);

    if let Some(address) = cli.wallet {
        market.identity_mut().connect(address);
    }
    if cli.guest {
        market.identity_mut().disconnect();
    }
    if let Some(address) = market.identity().current_identity() {
        market
            .executor()
            .open_account(&address, config.starting_balance)
            .await?;
    }

    run(cli.command, &mut market, &config).await
}

async fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.store {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::File => Arc::new(FileStore::new(&config.data_dir)),
        StoreKind::MongoDb => {
            Arc::new(MongoStore::connect(&config.mongodb_uri, &config.mongodb_database).await?)
        }
    };

    info!("Using {:?} listing store", config.store);
    Ok(store)
}

async fn run(command: Command, market: &mut Market, config: &Config) -> Result<()> {
    match command {
        Command::Browse {
            search,
            sort,
            min,
            max,
            verified,
        } => {
            if market.catalog().is_empty() {
                println!("The catalog is empty");
                return Ok(());
            }

            let filter = ListingFilter {
                min_price: min.as_deref().map(parse_sol).transpose()?,
                max_price: max.as_deref().map(parse_sol).transpose()?,
                verified_only: verified,
                ..ListingFilter::search(search)
            };

            let listings = market.browse(&filter, sort);
            println!("{} of {} listings", listings.len(), market.catalog().len());
            print_listings(&listings);
        }
        Command::Mine => {
            if !market.identity().is_connected() {
                return Err(eyre!("Connect a wallet (MARKETPLACE_WALLET) to see your listings"));
            }
            print_listings(&market.my_listings());
        }
        Command::List {
            mint,
            price,
            name,
            symbol,
            description,
            image,
            attributes,
        } => {
            let mut draft = ListingDraft::from_sol(&mint, &price)?
                .name(name.unwrap_or_default())
                .symbol(symbol.unwrap_or_default())
                .description(description.unwrap_or_default())
                .image(image.unwrap_or_default());

            for pair in &attributes {
                let (trait_type, value) = pair
                    .split_once('=')
                    .ok_or_else(|| eyre!("Attribute '{}' is not TRAIT=VALUE", pair))?;
                draft = draft.attribute(trait_type, value)?;
            }

            let listing = market.list(draft).await?;
            println!("Listed {} for {} SOL", listing.id, format_sol(listing.price));
        }
        Command::ListForm { path } => {
            let raw = tokio::fs::read_to_string(&path).await?;
            let form: ListingForm = serde_json::from_str(&raw)?;

            let listing = market.list(ListingDraft::try_from(form)?).await?;
            println!("Listed {} for {} SOL", listing.id, format_sol(listing.price));
        }
        Command::Delist { id } => {
            let listing = market.delist(&id).await?;
            println!("Delisted {} ({})", listing.id, listing.mint);
        }
        Command::Buy { id } => {
            let receipt = market.buy(&id).await?;
            println!(
                "Bought {} for {} SOL\n{}",
                receipt.mint,
                format_sol(receipt.price),
                receipt.explorer_url
            );
        }
        Command::Balance => {
            let balance = market.balance().await?;
            println!("{} SOL", format_sol(balance));
        }
        Command::Faucet => {
            let reference = market.airdrop().await?;
            println!("Airdrop confirmed: {}", reference);
        }
        Command::Links => {
            let address = market
                .identity()
                .current_identity()
                .ok_or_else(|| eyre!("No wallet connected"))?;
            println!("Faucet:   {}", faucet_url(&address));
            println!("Explorer: {}", explorer_address_url(&address, config.cluster));
        }
    }

    Ok(())
}

fn print_listings(listings: &[Listing]) {
    if listings.is_empty() {
        println!("No listings found");
        return;
    }

    for listing in listings {
        let name = if listing.name.is_empty() {
            short_address(&listing.mint)
        } else {
            listing.name.clone()
        };

        println!(
            "{:<26} {:<28} {:>10} SOL  seller {}{}",
            listing.id,
            name,
            format_sol(listing.price),
            short_address(&listing.seller),
            if listing.verified { "  [verified]" } else { "" }
        );
    }
}
