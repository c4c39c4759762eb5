//! Client-side validation errors

use thiserror::Error;

/// Failures raised locally, before any request is made
///
/// Display strings are the exact messages shown next to the offending
/// form control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No token (please re-login)")]
    MissingToken,

    #[error("Name is required")]
    EmptyName,

    #[error("Price must be > 0")]
    NonPositivePrice,

    #[error("Category is required")]
    MissingCategory,
}
