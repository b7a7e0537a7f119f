use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use estore_contract::{EStoreContract, Invocation};
use estore_server::{EStoreServer, ServerConfig};
use estore_store::{FileLedgerStore, Ledger, StoreConfig};
use estore_types::{is_truthy_str, Product};
use serde_json::Value;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(args, &cli.data),
        command => {
            let ledger = open_ledger(&cli.data)?;
            let output = execute(&ledger, command, &format)?;
            println!("{output}");
            Ok(())
        }
    }
}

fn open_ledger(path: &Path) -> anyhow::Result<Ledger<FileLedgerStore>> {
    let store = FileLedgerStore::open(path, &StoreConfig::default())
        .with_context(|| format!("opening ledger {}", path.display()))?;
    tracing::debug!(path = %path.display(), entries = store.len()?, "ledger opened");
    Ok(Ledger::new(store))
}

/// Run one ledger command as a transaction and render its result.
fn execute(
    ledger: &Ledger<FileLedgerStore>,
    command: Command,
    format: &OutputFormat,
) -> anyhow::Result<String> {
    let contract = EStoreContract::new();
    let output = match command {
        Command::Init => {
            let seeded = ledger.transact(|tx| contract.init_ledger(tx))?;
            match format {
                OutputFormat::Json => serde_json::to_string_pretty(&seeded)?,
                OutputFormat::Text => format!(
                    "{} Seeded {} products\n{}",
                    "✓".green().bold(),
                    seeded.len(),
                    product_lines(&seeded)
                ),
            }
        }
        Command::Release(args) => {
            let owner = args.owner.unwrap_or_else(|| args.vendor.clone());
            let bought = is_truthy_str(&args.bought);
            let product = ledger.transact(|tx| {
                contract.release_product(tx, &args.vendor, &args.name, &args.price, &owner, bought)
            })?;
            match format {
                OutputFormat::Json => serde_json::to_string_pretty(&product)?,
                OutputFormat::Text => format!("{} Released {}", "✓".green().bold(), product_line(&product)),
            }
        }
        Command::Buy(args) => {
            let product = ledger
                .transact(|tx| contract.buy_product(tx, &args.vendor, &args.name, &args.new_owner))?;
            match format {
                OutputFormat::Json => serde_json::to_string_pretty(&product)?,
                OutputFormat::Text => format!(
                    "{} {} bought by {}",
                    "✓".green().bold(),
                    product.to_string().bold(),
                    product.owner().yellow()
                ),
            }
        }
        Command::View(args) => {
            // Stored text is printed untouched in both formats.
            ledger.query(|view| contract.view_product(view, &args.vendor, &args.name))?
        }
        Command::Unsold => {
            let unsold = ledger.query(|view| contract.view_unsold_products(view))?;
            match format {
                OutputFormat::Json => serde_json::to_string_pretty(&unsold)?,
                OutputFormat::Text if unsold.is_empty() => "No unsold products.".to_string(),
                OutputFormat::Text => product_lines(&unsold),
            }
        }
        Command::Invoke(args) => {
            let invocation = Invocation::parse(&args.function, &args.args)?;
            let payload = if invocation.is_read_only() {
                ledger.query(|view| contract.invoke(view, &invocation))?
            } else {
                ledger.transact(|tx| contract.invoke(tx, &invocation))?
            };
            match payload {
                Value::String(raw) => raw,
                other => serde_json::to_string_pretty(&other)?,
            }
        }
        Command::Serve(_) => anyhow::bail!("serve does not run as a ledger transaction"),
    };
    Ok(output)
}

fn cmd_serve(args: ServeArgs, data: &Path) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind}"))?;
    }
    if args.in_memory {
        config.data_path = None;
    } else if config.data_path.is_none() {
        config.data_path = Some(data.to_path_buf());
    }

    let ledger = match &config.data_path {
        Some(path) => path.display().to_string(),
        None => "in-memory".to_string(),
    };
    println!("E-Store server on {} (ledger: {})", config.bind_addr.to_string().bold(), ledger);

    let server = EStoreServer::new(config)?;
    tokio::runtime::Runtime::new()?.block_on(server.serve())?;
    Ok(())
}

fn product_line(product: &Product) -> String {
    let status = if product.is_bought() {
        "bought".red()
    } else {
        "unsold".green()
    };
    format!(
        "{}  price {}  owner {}  [{}]",
        product.to_string().bold(),
        product.price(),
        product.owner().yellow(),
        status
    )
}

fn product_lines(products: &[Product]) -> String {
    products
        .iter()
        .map(|p| format!("  {}", product_line(p)))
        .collect::<Vec<_>>()
        .join("\n")
}
