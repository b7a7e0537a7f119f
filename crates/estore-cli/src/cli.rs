use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "estore",
    about = "E-Store: ledger-backed product inventory",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Ledger file to operate on
    #[arg(long, global = true, default_value = "estore.wal")]
    pub data: PathBuf,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Seed the ledger with the starter products
    Init,
    /// Release a product into the store
    Release(ReleaseArgs),
    /// Buy an unbought product
    Buy(BuyArgs),
    /// Show the stored record of a product
    View(ViewArgs),
    /// List products that have not been bought
    Unsold,
    /// Invoke a contract function by name
    Invoke(InvokeArgs),
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct ReleaseArgs {
    pub vendor: String,
    pub name: String,
    pub price: String,
    /// Defaults to the vendor
    #[arg(long)]
    pub owner: Option<String>,
    /// Only the exact value "true" marks the product as bought
    #[arg(long, default_value = "false")]
    pub bought: String,
}

#[derive(Args)]
pub struct BuyArgs {
    pub vendor: String,
    pub name: String,
    pub new_owner: String,
}

#[derive(Args)]
pub struct ViewArgs {
    pub vendor: String,
    pub name: String,
}

#[derive(Args)]
pub struct InvokeArgs {
    pub function: String,
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<String>,
    /// TOML server configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Keep the ledger in memory instead of the --data file
    #[arg(long)]
    pub in_memory: bool,
}
