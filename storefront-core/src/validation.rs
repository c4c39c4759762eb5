//! Form field validation
//!
//! Runs before any request is made; a failure here never reaches the
//! network. Successful validation produces the JSON payload to submit.

use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ValidationError;

/// Editable fields of a category form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryFields {
    pub name: String,
}

impl CategoryFields {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Validate and build the request payload; the name is trimmed
    pub fn validate(&self) -> Result<Value, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(json!({ "name": name }))
    }
}

/// Editable fields of a product form
///
/// `price` stays raw text until validation because "must parse" is part
/// of the check. `category_id: None` is the unselected sentinel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFields {
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub price: String,
}

impl ProductFields {
    /// Validate and build the request payload
    ///
    /// Checks run in form order: category, name, then price.
    pub fn validate(&self) -> Result<Value, ValidationError> {
        let category_id = self.category_id.ok_or(ValidationError::MissingCategory)?;

        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let price: f64 = self
            .price
            .trim()
            .parse()
            .map_err(|_| ValidationError::NonPositivePrice)?;
        if !price.is_finite() || price <= 0.0 {
            return Err(ValidationError::NonPositivePrice);
        }

        Ok(json!({
            "category_id": category_id,
            "name": name,
            "description": self.description,
            "price": price,
        }))
    }
}
