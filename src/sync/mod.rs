//! Offline sync ingestion
//!
//! Terminals queue mutations locally and replay them with at-least-once
//! delivery. This module makes that safe server-side:
//!
//! - an idempotency ledger mapping client uuids to assigned server ids
//! - a per-year receipt sequencer with atomic increments
//! - a coordinator that runs each batch item in its own transaction and
//!   isolates per-item failures

pub mod coordinator;
pub mod ledger;
pub mod receipt;
pub mod types;

pub use coordinator::process_batch;
pub use types::{PushRequest, PushResponse};
