//! Catalog query state and its canonical request serialization
//!
//! `CatalogQuery` is a pure value: identical queries always serialize to
//! identical parameter lists, which is what makes stale-response
//! detection reliable.

use uuid::Uuid;

/// Category filter: everything, or a single category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Uuid),
}

/// Sort key accepted by the products endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Price,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Price => "price",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "created_at" => Some(SortField::CreatedAt),
            "price" => Some(SortField::Price),
            _ => None,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Default page size for the catalog list
pub const DEFAULT_LIMIT: u32 = 6;

/// Filter, sort, and pagination state for the product list
///
/// Fields are private so the page-reset invariant holds: changing any
/// filter or sort field snaps `page` back to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    text_filter: String,
    category_filter: CategoryFilter,
    min_price: Option<f64>,
    max_price: Option<f64>,
    sort: SortField,
    order: SortOrder,
    page: u32,
    limit: u32,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            text_filter: String::new(),
            category_filter: CategoryFilter::All,
            min_price: None,
            max_price: None,
            sort: SortField::CreatedAt,
            order: SortOrder::Desc,
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the page size (clamped to at least 1)
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn text_filter(&self) -> &str {
        &self.text_filter
    }

    pub fn category_filter(&self) -> CategoryFilter {
        self.category_filter
    }

    pub fn min_price(&self) -> Option<f64> {
        self.min_price
    }

    pub fn max_price(&self) -> Option<f64> {
        self.max_price
    }

    pub fn sort(&self) -> SortField {
        self.sort
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn set_text_filter(&mut self, text: impl Into<String>) {
        self.text_filter = text.into();
        self.page = 1;
    }

    pub fn set_category_filter(&mut self, filter: CategoryFilter) {
        self.category_filter = filter;
        self.page = 1;
    }

    pub fn set_min_price(&mut self, min: Option<f64>) {
        self.min_price = min;
        self.page = 1;
    }

    pub fn set_max_price(&mut self, max: Option<f64>) {
        self.max_price = max;
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortField) {
        self.sort = sort;
        self.page = 1;
    }

    pub fn set_order(&mut self, order: SortOrder) {
        self.order = order;
        self.page = 1;
    }

    /// Select a page without touching the filters (clamped to at least 1)
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Serialize to request parameters
    ///
    /// Key order is fixed and unset filters are omitted, so identical
    /// queries always produce identical parameter lists.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];

        let text = self.text_filter.trim();
        if !text.is_empty() {
            params.push(("q", text.to_string()));
        }
        if let CategoryFilter::Only(id) = self.category_filter {
            params.push(("category_id", id.to_string()));
        }
        if let Some(min) = self.min_price {
            params.push(("min_price", min.to_string()));
        }
        if let Some(max) = self.max_price {
            params.push(("max_price", max.to_string()));
        }

        params.push(("sort", self.sort.as_str().to_string()));
        params.push(("order", self.order.as_str().to_string()));
        params
    }
}

/// One page of results plus the authoritative total
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> ListResult<T> {
    /// Pages implied by `total`; never less than 1
    pub fn page_count(&self) -> u32 {
        page_count(self.total, self.limit)
    }
}

/// Pagination math shared by every list view
pub fn page_count(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 1;
    }
    (total.div_ceil(limit as u64) as u32).max(1)
}
