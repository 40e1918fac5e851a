#![forbid(unsafe_code)]
//! VaultNexus command-line client
//!
//! Operates directly on a local marketplace database: register assets,
//! inspect listings, check acquisition records. Caller identities are
//! derived from names (`--caller alice`), matching the dev-ledger principals
//! the server uses.

use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use vault_nexus::error::Result;
use vault_nexus::identity::{principal_from_string, principal_to_hex};
use vault_nexus::marketplace::Marketplace;
use vault_nexus::persistence::{Database, Persistence};
use vault_nexus::registry::AssetDraft;

#[derive(Parser)]
#[command(name = "vault-nexus", about = "Digital-asset marketplace ledger")]
struct Cli {
    /// Path to the marketplace database
    #[arg(long, default_value = "./vault-nexus.db")]
    db: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new asset
    Register {
        /// Name the caller principal is derived from
        #[arg(long)]
        caller: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        price: u64,
        #[arg(long, default_value = "general")]
        sector: String,
        #[arg(long, default_value = "")]
        thumbnail: String,
        #[arg(long, default_value = "")]
        resource: String,
        #[arg(long, default_value_t = 0)]
        royalty: u64,
    },
    /// Show one asset
    Show { id: u64 },
    /// List all registered assets
    List,
    /// Print the number of registered assets
    Count,
    /// Check whether a buyer has acquired an asset
    Verify {
        id: u64,
        /// Name the buyer principal is derived from
        buyer: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let db = Database::open(&cli.db)?;
    let mut market = db.load_marketplace()?;

    match cli.command {
        Command::Register {
            caller,
            name,
            description,
            price,
            sector,
            thumbnail,
            resource,
            royalty,
        } => {
            let principal = principal_from_string(&caller);
            let id = market.register_asset(
                principal,
                AssetDraft {
                    name,
                    description,
                    price,
                    sector,
                    thumbnail,
                    resource,
                    royalty,
                },
            )?;
            db.save_marketplace(&market)?;
            println!("{}", format!("✅ Registered asset {}", id).green().bold());
        }
        Command::Show { id } => match market.fetch_asset(id) {
            Some(asset) => {
                println!("{}", format!("Asset {}", asset.id).bright_cyan().bold());
                println!("  name:        {}", asset.name);
                println!("  description: {}", asset.description);
                println!("  price:       {}", asset.price);
                println!("  sector:      {}", asset.sector);
                println!("  royalty:     {}%", asset.royalty);
                println!(
                    "  status:      {}",
                    if asset.active {
                        "active".green()
                    } else {
                        "inactive".red()
                    }
                );
                println!("  vendor:      {}", principal_to_hex(&asset.vendor));
                println!("  creator:     {}", principal_to_hex(&asset.creator));
                println!("  registered:  {}", asset.registered_at);
            }
            None => println!("{}", format!("Asset {} not found", id).red()),
        },
        Command::List => {
            let assets = market.list_assets();
            if assets.is_empty() {
                println!("{}", "No assets registered yet".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "Name", "Sector", "Price", "Royalty", "Status"]);
            for asset in assets {
                table.add_row(vec![
                    Cell::new(asset.id),
                    Cell::new(&asset.name),
                    Cell::new(&asset.sector),
                    Cell::new(asset.price),
                    Cell::new(format!("{}%", asset.royalty)),
                    Cell::new(if asset.active { "active" } else { "inactive" }),
                ]);
            }
            println!("{table}");
        }
        Command::Count => {
            println!("{}", market.count_registered_assets());
        }
        Command::Verify { id, buyer } => {
            let principal = principal_from_string(&buyer);
            if market.verify_acquisition(id, &principal) {
                println!("{}", format!("{} has acquired asset {}", buyer, id).green());
            } else {
                println!(
                    "{}",
                    format!("{} has not acquired asset {}", buyer, id).yellow()
                );
            }
        }
    }

    Ok(())
}
