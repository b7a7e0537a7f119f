use estore_store::{product_key, products_prefix, CompositeKey, LedgerStore};
use estore_types::Product;
use tracing::{debug, info};

use crate::error::{ContractError, ContractResult};

/// The e-store contract.
///
/// Products are stored as JSON under the composite key
/// `PROD/{vendor}/{name}`. The contract holds no state of its own; every
/// operation reads and writes through the ledger context it is given.
#[derive(Clone, Copy, Debug, Default)]
pub struct EStoreContract;

/// The products [`EStoreContract::init_ledger`] releases, in order.
pub fn seed_products() -> Vec<Product> {
    vec![
        Product::listing("apple", "airpods", "1000"),
        Product::listing("microsoft", "office-suite", "500"),
    ]
}

impl EStoreContract {
    pub fn new() -> Self {
        Self
    }

    /// Release the seed products.
    ///
    /// Running this again overwrites the seed keys with identical values.
    pub fn init_ledger(&self, ctx: &dyn LedgerStore) -> ContractResult<Vec<Product>> {
        let seeds = seed_products();
        for product in &seeds {
            self.store(ctx, product)?;
        }
        info!(count = seeds.len(), "ledger initialized");
        Ok(seeds)
    }

    /// Release a product into the store.
    ///
    /// This is an upsert: a product already stored under the same vendor and
    /// name is replaced entirely.
    pub fn release_product(
        &self,
        ctx: &dyn LedgerStore,
        vendor: &str,
        name: &str,
        price: &str,
        owner: &str,
        bought: bool,
    ) -> ContractResult<Product> {
        let product = Product::new(vendor, name, price, owner, bought);
        self.store(ctx, &product)?;
        info!(vendor, name, price, owner, bought, "product released");
        Ok(product)
    }

    /// Buy an unbought product, transferring it to `new_owner`.
    pub fn buy_product(
        &self,
        ctx: &dyn LedgerStore,
        vendor: &str,
        name: &str,
        new_owner: &str,
    ) -> ContractResult<Product> {
        let key = product_key(vendor, name)?;
        let raw = read_existing(ctx, &key)?;
        let product =
            Product::from_json_bytes(&raw).map_err(|e| ContractError::decode(&key, e))?;

        if product.is_bought() {
            return Err(ContractError::AlreadyBought(key));
        }

        let product = product.with_owner(new_owner).mark_bought();
        write_product(ctx, &key, &product)?;
        info!(vendor, name, new_owner, "product bought");
        Ok(product)
    }

    /// Return the stored record for a product, exactly as it was written.
    pub fn view_product(
        &self,
        ctx: &dyn LedgerStore,
        vendor: &str,
        name: &str,
    ) -> ContractResult<String> {
        let key = product_key(vendor, name)?;
        let raw = read_existing(ctx, &key)?;
        debug!(vendor, name, len = raw.len(), "product viewed");
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    /// List every product that has not been bought, in key order.
    ///
    /// A record that fails to decode aborts the whole listing.
    pub fn view_unsold_products(&self, ctx: &dyn LedgerStore) -> ContractResult<Vec<Product>> {
        let mut unsold = Vec::new();
        let mut scanned = 0usize;
        for entry in ctx.scan_prefix(&products_prefix())? {
            let (key, raw) = entry?;
            let product =
                Product::from_json_bytes(&raw).map_err(|e| ContractError::decode(&key, e))?;
            scanned += 1;
            if !product.is_bought() {
                unsold.push(product);
            }
        }
        debug!(scanned, unsold = unsold.len(), "unsold products listed");
        Ok(unsold)
    }

    fn store(&self, ctx: &dyn LedgerStore, product: &Product) -> ContractResult<()> {
        let key = product_key(product.vendor(), product.name())?;
        write_product(ctx, &key, product)
    }
}

/// Read a key, treating a missing or empty value as absent.
fn read_existing(ctx: &dyn LedgerStore, key: &CompositeKey) -> ContractResult<Vec<u8>> {
    match ctx.get(key)? {
        Some(raw) if !raw.is_empty() => Ok(raw),
        _ => Err(ContractError::NotFound(key.clone())),
    }
}

fn write_product(ctx: &dyn LedgerStore, key: &CompositeKey, product: &Product) -> ContractResult<()> {
    let bytes = product
        .to_json_bytes()
        .map_err(|e| ContractError::Encode(e.to_string()))?;
    ctx.put(key, &bytes)?;
    Ok(())
}
