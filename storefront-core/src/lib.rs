//! Storefront Core Library
//!
//! Protocol-level types for the product-catalog client:
//! - Wire models and the success/error envelopes every endpoint uses
//! - The catalog query with its canonical parameter serialization
//! - Client-side form validation and the managed-entity descriptions
//!
//! Everything here is pure: no I/O, no async.

pub mod envelope;
pub mod error;
pub mod models;
pub mod query;
pub mod resource;
pub mod validation;

pub use envelope::{CountMeta, Envelope, ErrorBody, ErrorEnvelope, ListMeta};
pub use error::ValidationError;
pub use models::{Category, Health, Product, Role, TokenGrant, UserIdentity};
pub use query::{page_count, CatalogQuery, CategoryFilter, ListResult, SortField, SortOrder};
pub use resource::AdminResource;
pub use validation::{CategoryFields, ProductFields};
