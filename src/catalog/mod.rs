//! Catalog distribution
//!
//! Server-owned master data (products, categories) distributed to terminals
//! as incremental deltas against a client-supplied checkpoint. The only
//! writer is the admin bulk upsert; the ingestion path never touches it.

mod store;
mod types;

pub use store::{watermark, CatalogRepository};
pub use types::{
    CatalogCategory, CatalogProduct, CategoryUpsert, ProductUpsert, PullResponse, UpsertResponse,
};
