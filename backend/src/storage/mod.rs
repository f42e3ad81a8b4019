//! # Storage Module
//!
//! SQLite persistence for the ledger. The store owns the `users` and
//! `chat_accounts` tables and is the sole arbiter of per-group serialization:
//! every unit of work flows through a single-connection pool and the balance
//! delta is applied as an atomic in-place update.

pub mod db;

pub use db::DbConnection;
