//! Shared wallet ledger for group chats.
//!
//! Members post short text fragments such as `+50руб` or `-20$`; the engine
//! turns them into validated, signed monetary deltas and applies them
//! atomically to a per-chat balance. Layered as domain (business logic),
//! storage (SQLite persistence) and rest (HTTP surface).

pub mod config;
pub mod domain;
pub mod rest;
pub mod storage;
