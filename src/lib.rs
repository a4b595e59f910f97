//! POS sync server
//!
//! Reconciles transactional records pushed from offline terminals (orders,
//! refunds, shifts, cash events) into a durable SQLite store, and
//! distributes catalog deltas back to them. Ingestion is idempotent under
//! at-least-once delivery; failures are isolated per batch item.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod reducers;
pub mod reports;
pub mod routes;
pub mod state;
pub mod sync;
