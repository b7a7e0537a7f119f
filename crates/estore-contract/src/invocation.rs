//! By-name invocation surface.
//!
//! Host platforms call the contract with a function name and a list of
//! string arguments. [`Invocation::parse`] turns that into a typed call and
//! [`EStoreContract::invoke`] runs it, returning a JSON payload.

use estore_store::LedgerStore;
use estore_types::is_truthy_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contract::EStoreContract;
use crate::error::{ContractError, ContractResult};

/// A raw invocation as it arrives from a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// A parsed contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    InitLedger,
    ReleaseProduct {
        vendor: String,
        name: String,
        price: String,
        owner: String,
        bought: bool,
    },
    BuyProduct {
        vendor: String,
        name: String,
        new_owner: String,
    },
    ViewProduct {
        vendor: String,
        name: String,
    },
    ViewUnsoldProducts,
}

impl Invocation {
    /// Parse a function name and its arguments.
    ///
    /// `releaseProduct` takes its `bought` flag as text; only the exact
    /// string `"true"` marks the product as bought.
    pub fn parse(function: &str, args: &[String]) -> ContractResult<Self> {
        let arity = |expected: usize| -> ContractResult<()> {
            if args.len() == expected {
                Ok(())
            } else {
                Err(ContractError::InvalidArguments {
                    function: function.to_string(),
                    expected,
                    actual: args.len(),
                })
            }
        };

        match function {
            "initLedger" => {
                arity(0)?;
                Ok(Self::InitLedger)
            }
            "releaseProduct" => {
                arity(5)?;
                Ok(Self::ReleaseProduct {
                    vendor: args[0].clone(),
                    name: args[1].clone(),
                    price: args[2].clone(),
                    owner: args[3].clone(),
                    bought: is_truthy_str(&args[4]),
                })
            }
            "buyProduct" => {
                arity(3)?;
                Ok(Self::BuyProduct {
                    vendor: args[0].clone(),
                    name: args[1].clone(),
                    new_owner: args[2].clone(),
                })
            }
            "viewProduct" => {
                arity(2)?;
                Ok(Self::ViewProduct {
                    vendor: args[0].clone(),
                    name: args[1].clone(),
                })
            }
            "viewUnsoldProducts" => {
                arity(0)?;
                Ok(Self::ViewUnsoldProducts)
            }
            other => Err(ContractError::UnknownFunction(other.to_string())),
        }
    }

    /// The function name this call is dispatched under.
    pub fn function(&self) -> &'static str {
        match self {
            Self::InitLedger => "initLedger",
            Self::ReleaseProduct { .. } => "releaseProduct",
            Self::BuyProduct { .. } => "buyProduct",
            Self::ViewProduct { .. } => "viewProduct",
            Self::ViewUnsoldProducts => "viewUnsoldProducts",
        }
    }

    /// Whether the call only reads the ledger.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ViewProduct { .. } | Self::ViewUnsoldProducts)
    }
}

impl TryFrom<&InvocationRequest> for Invocation {
    type Error = ContractError;

    fn try_from(request: &InvocationRequest) -> ContractResult<Self> {
        Self::parse(&request.function, &request.args)
    }
}

impl EStoreContract {
    /// Run a parsed call and return its payload as JSON.
    ///
    /// `viewProduct` yields the stored record as a JSON string, untouched;
    /// every other call yields the product or list of products it produced.
    pub fn invoke(&self, ctx: &dyn LedgerStore, invocation: &Invocation) -> ContractResult<Value> {
        let payload = match invocation {
            Invocation::InitLedger => to_value(self.init_ledger(ctx)?)?,
            Invocation::ReleaseProduct {
                vendor,
                name,
                price,
                owner,
                bought,
            } => to_value(self.release_product(ctx, vendor, name, price, owner, *bought)?)?,
            Invocation::BuyProduct {
                vendor,
                name,
                new_owner,
            } => to_value(self.buy_product(ctx, vendor, name, new_owner)?)?,
            Invocation::ViewProduct { vendor, name } => {
                Value::String(self.view_product(ctx, vendor, name)?)
            }
            Invocation::ViewUnsoldProducts => to_value(self.view_unsold_products(ctx)?)?,
        };
        Ok(payload)
    }
}

fn to_value<T: Serialize>(value: T) -> ContractResult<Value> {
    serde_json::to_value(value).map_err(|e| ContractError::Encode(e.to_string()))
}
