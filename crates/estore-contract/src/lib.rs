//! The e-store contract.
//!
//! This crate is the heart of the e-store. It provides:
//! - [`EStoreContract`], the four product operations plus ledger seeding
//! - [`Invocation`], the by-name call surface a host platform dispatches through
//! - [`ContractError`], the failures an invocation can report
//!
//! Operations never open transactions themselves. They receive the
//! invocation's ledger context as a parameter, usually a
//! [`estore_store::TxContext`] handed out by [`estore_store::Ledger::transact`].

pub mod contract;
pub mod error;
pub mod invocation;

pub use contract::{seed_products, EStoreContract};
pub use error::{ContractError, ContractResult};
pub use invocation::{Invocation, InvocationRequest};
