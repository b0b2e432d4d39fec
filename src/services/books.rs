//! Book catalogue service: creation, edits, checkout and return

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{Book, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository.books.get_all().await
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a book, assigning a fresh UUID when no id is supplied
    pub async fn create(&self, data: CreateBook) -> AppResult<Book> {
        data.validate()?;

        let book = Book {
            id: data
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(generate_id),
            title: data.title,
            author: data.author,
            quantity: data.quantity,
        };

        self.repository.books.create(&book).await?;
        tracing::info!(book_id = %book.id, quantity = book.quantity, "Book created");
        Ok(book)
    }

    /// Edit title, author or quantity of an existing book.
    ///
    /// Fields missing from `data` are left untouched by the store, so a
    /// concurrent checkout or return is never overwritten.
    pub async fn update(&self, id: &str, data: UpdateBook) -> AppResult<Book> {
        data.validate()?;

        let book = self.repository.books.update(id, &data).await?;
        tracing::info!(book_id = %book.id, "Book updated");
        Ok(book)
    }

    /// Lend one copy out
    pub async fn checkout(&self, id: &str) -> AppResult<Book> {
        let book = self
            .repository
            .books
            .decrement_quantity(id)
            .await
            .inspect_err(|e| tracing::debug!(book_id = %id, "Checkout rejected: {}", e))?;
        tracing::info!(book_id = %id, quantity = book.quantity, "Book checked out");
        Ok(book)
    }

    /// Take one copy back
    pub async fn return_book(&self, id: &str) -> AppResult<Book> {
        let book = self
            .repository
            .books
            .increment_quantity(id)
            .await
            .inspect_err(|e| tracing::debug!(book_id = %id, "Return rejected: {}", e))?;
        tracing::info!(book_id = %id, quantity = book.quantity, "Book returned");
        Ok(book)
    }

    /// Storage readiness
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.books.ping().await
    }
}
