//! Storefront Client
//!
//! Client-side state for the product catalog: session lifecycle,
//! derived-query catalog browsing, and admin CRUD over the backend's
//! JSON API.

pub mod admin;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod token;

pub use admin::{AdminController, AdminState, Confirmation, FormDraft, FormMode};
pub use catalog::{fetch_categories, fetch_product, CatalogController, CatalogState};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::ApiClient;
pub use session::{Session, SessionManager, SessionStatus, TokenProvider};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};
