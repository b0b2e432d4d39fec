//! In-memory book repository

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::BookRepository;
use crate::{
    error::{AppError, AppResult},
    models::{Book, UpdateBook},
};

/// Book store kept in process memory.
///
/// Every mutation holds the write lock for its whole check-and-write.
#[derive(Debug, Default)]
pub struct MemoryBookRepository {
    books: RwLock<BTreeMap<String, Book>>,
}

impl MemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with `books`
    pub fn with_data(books: Vec<Book>) -> Self {
        Self {
            books: RwLock::new(books.into_iter().map(|b| (b.id.clone(), b)).collect()),
        }
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

/// Mirrors the `CHECK (quantity >= 0)` constraint of the books table
fn check_quantity(quantity: i32) -> AppResult<()> {
    if quantity < 0 {
        return Err(AppError::Validation("Quantity must not be negative".to_string()));
    }
    Ok(())
}

#[async_trait]
impl BookRepository for MemoryBookRepository {
    async fn get_all(&self) -> AppResult<Vec<Book>> {
        Ok(self.books.read().await.values().cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Book> {
        self.books
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn create(&self, book: &Book) -> AppResult<()> {
        check_quantity(book.quantity)?;
        let mut books = self.books.write().await;
        if books.contains_key(&book.id) {
            return Err(AppError::Conflict(format!("Book {} already exists", book.id)));
        }
        books.insert(book.id.clone(), book.clone());
        Ok(())
    }

    async fn update(&self, id: &str, changes: &UpdateBook) -> AppResult<Book> {
        if let Some(quantity) = changes.quantity {
            check_quantity(quantity)?;
        }
        let mut books = self.books.write().await;
        let book = books.get_mut(id).ok_or_else(|| not_found(id))?;
        book.apply(changes.clone());
        Ok(book.clone())
    }

    async fn decrement_quantity(&self, id: &str) -> AppResult<Book> {
        let mut books = self.books.write().await;
        let book = books.get_mut(id).ok_or_else(|| not_found(id))?;
        if book.quantity <= 0 {
            return Err(AppError::Unavailable(format!("Book {} not available", id)));
        }
        book.quantity -= 1;
        Ok(book.clone())
    }

    async fn increment_quantity(&self, id: &str) -> AppResult<Book> {
        let mut books = self.books.write().await;
        let book = books.get_mut(id).ok_or_else(|| not_found(id))?;
        book.quantity = book
            .quantity
            .checked_add(1)
            .ok_or_else(|| AppError::Internal(format!("Quantity overflow for book {}", id)))?;
        Ok(book.clone())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
