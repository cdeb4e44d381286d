pub mod account_registry;
pub mod certificate_ledger;
pub mod certificate_store;
pub mod snapshot;
