// src/repositories/sqlite/mod.rs

pub mod ledger;

pub use self::ledger::SqliteLedgerRepository;
