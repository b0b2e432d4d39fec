//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book record as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    /// Copies currently on hand, never negative
    pub quantity: i32,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    /// Identifier; a UUID is generated when absent or blank
    pub id: Option<String>,
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    pub quantity: i32,
}

/// Update book request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: Option<String>,
    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    pub quantity: Option<i32>,
}

impl Book {
    /// Apply the fields present in an update request
    pub fn apply(&mut self, update: UpdateBook) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(author) = update.author {
            self.author = author;
        }
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
        }
    }
}
