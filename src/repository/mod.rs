//! Repository layer for book storage

pub mod books;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Book, UpdateBook},
};

pub use books::PgBookRepository;
pub use memory::MemoryBookRepository;

/// Storage contract for books.
///
/// Every write is a single atomic statement: `update` only touches the fields
/// present in the request, and quantity changes go through
/// `decrement_quantity` / `increment_quantity` so that concurrent checkouts
/// can never drive a quantity below zero. Writes carrying a negative quantity
/// fail with `Validation`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All books, ordered by id
    async fn get_all(&self) -> AppResult<Vec<Book>>;

    /// Fails with `NotFound` when no book has this id
    async fn get_by_id(&self, id: &str) -> AppResult<Book>;

    /// Fails with `Conflict` when the id is already taken
    async fn create(&self, book: &Book) -> AppResult<()>;

    /// Apply the fields present in `changes` and return the stored book
    async fn update(&self, id: &str, changes: &UpdateBook) -> AppResult<Book>;

    /// Take one copy out. `Unavailable` when none are on hand.
    async fn decrement_quantity(&self, id: &str) -> AppResult<Book>;

    /// Put one copy back
    async fn increment_quantity(&self, id: &str) -> AppResult<Book>;

    /// Readiness probe
    async fn ping(&self) -> AppResult<()>;
}

/// Main repository struct holding the configured storage backend
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookRepository>,
}

impl Repository {
    /// Create a repository backed by PostgreSQL
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(PgBookRepository::new(pool)),
        }
    }

    /// Create a repository backed by an in-process map
    pub fn memory() -> Self {
        Self::with_books(Arc::new(MemoryBookRepository::new()))
    }

    /// Create a repository around any book store
    pub fn with_books(books: Arc<dyn BookRepository>) -> Self {
        Self { books }
    }
}
