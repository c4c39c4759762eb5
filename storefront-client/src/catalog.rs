//! Catalog browsing
//!
//! Holds the current query and the list it produced. Every query edit
//! triggers a fetch; when fetches overlap, only the most recently
//! issued one may write its result back, so the list always reflects
//! the latest query.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use uuid::Uuid;

use storefront_core::models::{Category, Product};
use storefront_core::query::{CatalogQuery, ListResult};
use storefront_core::resource::AdminResource;

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;

/// Catalog list state
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    pub items: Vec<Product>,
    pub total: u64,
    pub loading: bool,
    pub error: Option<String>,
}

/// Drives the product list from a [`CatalogQuery`]
pub struct CatalogController {
    api: ApiClient,
    query: RwLock<CatalogQuery>,
    state: RwLock<CatalogState>,
    issued: AtomicU64,
}

impl CatalogController {
    pub fn new(api: ApiClient) -> Self {
        Self::with_query(api, CatalogQuery::default())
    }

    pub fn with_query(api: ApiClient, query: CatalogQuery) -> Self {
        Self {
            api,
            query: RwLock::new(query),
            state: RwLock::new(CatalogState::default()),
            issued: AtomicU64::new(0),
        }
    }

    /// Current query
    pub fn query(&self) -> CatalogQuery {
        self.query.read().unwrap().clone()
    }

    /// Current list state
    pub fn state(&self) -> CatalogState {
        self.state.read().unwrap().clone()
    }

    /// Number of pages for the current total and page size
    pub fn page_count(&self) -> u32 {
        let total = self.state.read().unwrap().total;
        let limit = self.query.read().unwrap().limit();
        storefront_core::query::page_count(total, limit)
    }

    /// Edit the query, then fetch the list it now describes
    pub async fn update<F: FnOnce(&mut CatalogQuery)>(&self, edit: F) -> ClientResult<()> {
        edit(&mut *self.query.write().unwrap());
        self.refresh().await
    }

    /// Fetch the list for the current query
    ///
    /// If a newer fetch was issued while this one was in flight, its
    /// response is discarded without touching the state.
    pub async fn refresh(&self) -> ClientResult<()> {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let params = self.query.read().unwrap().to_params();
        self.state.write().unwrap().loading = true;

        let result = self.fetch(&params).await;

        let mut state = self.state.write().unwrap();
        if self.issued.load(Ordering::SeqCst) != ticket {
            tracing::debug!("discarding stale catalog response (ticket {})", ticket);
            return Ok(());
        }
        state.loading = false;
        match result {
            Ok(list) => {
                state.items = list.items;
                state.total = list.total;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                state.error = Some(match &e {
                    ClientError::Api { message, .. } => message.clone(),
                    _ => "Failed to load products".to_string(),
                });
                Err(e)
            }
        }
    }

    async fn fetch(&self, params: &[(&str, String)]) -> ClientResult<ListResult<Product>> {
        let body = self.api.get_with_params("/products", params, None).await?;
        Ok(Product::decode_list(body)?)
    }
}

/// Fetch a single product by id
pub async fn fetch_product(api: &ApiClient, id: &Uuid) -> ClientResult<Product> {
    api.get_data(&format!("/products/{}", id), None).await
}

/// Fetch all categories, for filter menus and product forms
pub async fn fetch_categories(api: &ApiClient) -> ClientResult<Vec<Category>> {
    api.get_data("/categories", None).await
}
