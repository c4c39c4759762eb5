//! Managed-entity descriptions for the admin CRUD workflow
//!
//! Everything here is pure: endpoint paths, list parameters, list
//! decoding, and form validation. The controllers in the client crate
//! supply the I/O.

use serde_json::Value;
use uuid::Uuid;

use crate::envelope::{CountMeta, Envelope, ListMeta};
use crate::error::ValidationError;
use crate::models::{Category, Product};
use crate::query::ListResult;
use crate::validation::{CategoryFields, ProductFields};

/// Products-per-page in the admin list
const PRODUCT_PAGE_SIZE: u32 = 8;

/// An entity type managed through the admin CRUD workflow
pub trait AdminResource: Clone {
    /// Editable form fields for this entity
    type Fields: Clone + Default;

    /// Noun used in status messages ("Product created")
    const KIND: &'static str;

    /// Collection endpoint
    fn collection_path() -> &'static str;

    /// Item endpoint for one entity
    fn item_path(id: Uuid) -> String {
        format!("{}/{}", Self::collection_path(), id)
    }

    /// Query parameters for one list page
    fn list_params(page: u32) -> Vec<(&'static str, String)>;

    /// Decode a list response body into a page of entities
    fn decode_list(body: Value) -> serde_json::Result<ListResult<Self>>;

    fn id(&self) -> Uuid;

    /// Display label used in confirmation prompts
    fn label(&self) -> &str;

    /// Seed form fields from an existing entity
    fn to_fields(&self) -> Self::Fields;

    /// Validate form fields into a request payload
    fn validate(fields: &Self::Fields) -> Result<Value, ValidationError>;
}

impl AdminResource for Category {
    type Fields = CategoryFields;

    const KIND: &'static str = "Category";

    fn collection_path() -> &'static str {
        "/categories"
    }

    fn list_params(_page: u32) -> Vec<(&'static str, String)> {
        // Categories are few; the endpoint returns all of them at once.
        Vec::new()
    }

    fn decode_list(body: Value) -> serde_json::Result<ListResult<Self>> {
        let envelope: Envelope<Vec<Category>> = serde_json::from_value(body)?;
        let mut items = envelope.data;
        // Server order is unspecified; sort for display stability.
        items.sort_by(|a, b| a.name.cmp(&b.name));

        let total = match envelope.meta {
            Some(meta) => serde_json::from_value::<CountMeta>(meta)?.count,
            None => items.len() as u64,
        };
        let limit = (items.len() as u32).max(1);
        Ok(ListResult {
            items,
            total,
            page: 1,
            limit,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn to_fields(&self) -> CategoryFields {
        CategoryFields {
            name: self.name.clone(),
        }
    }

    fn validate(fields: &CategoryFields) -> Result<Value, ValidationError> {
        fields.validate()
    }
}

impl AdminResource for Product {
    type Fields = ProductFields;

    const KIND: &'static str = "Product";

    fn collection_path() -> &'static str {
        "/products"
    }

    fn list_params(page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("page", page.to_string()),
            ("limit", PRODUCT_PAGE_SIZE.to_string()),
        ]
    }

    fn decode_list(body: Value) -> serde_json::Result<ListResult<Self>> {
        let envelope: Envelope<Vec<Product>> = serde_json::from_value(body)?;
        let meta: ListMeta = serde_json::from_value(envelope.meta.unwrap_or(Value::Null))?;
        Ok(ListResult {
            items: envelope.data,
            total: meta.total,
            page: meta.page,
            limit: meta.limit,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn to_fields(&self) -> ProductFields {
        ProductFields {
            category_id: Some(self.category_id),
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price.to_string(),
        }
    }

    fn validate(fields: &ProductFields) -> Result<Value, ValidationError> {
        fields.validate()
    }
}
