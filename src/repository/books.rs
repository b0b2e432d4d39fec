//! PostgreSQL book repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::BookRepository;
use crate::{
    error::{AppError, AppResult},
    models::{Book, UpdateBook},
};

#[derive(Clone)]
pub struct PgBookRepository {
    pool: Pool<Postgres>,
}

impl PgBookRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

/// Translate constraint violations into the same errors the memory store returns
fn write_error(e: sqlx::Error, id: &str) -> AppError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("Book {} already exists", id))
        }
        sqlx::Error::Database(db) if db.is_check_violation() => {
            AppError::Validation("Quantity must not be negative".to_string())
        }
        e => e.into(),
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn get_all(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, quantity FROM books ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT id, title, author, quantity FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn create(&self, book: &Book) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, quantity)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.quantity)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &book.id))?;
        Ok(())
    }

    async fn update(&self, id: &str, changes: &UpdateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                quantity = COALESCE($4, quantity)
            WHERE id = $1
            RETURNING id, title, author, quantity
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.author)
        .bind(changes.quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, id))?
        .ok_or_else(|| not_found(id))
    }

    async fn decrement_quantity(&self, id: &str) -> AppResult<Book> {
        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET quantity = quantity - 1
            WHERE id = $1 AND quantity > 0
            RETURNING id, title, author, quantity
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(book) = updated {
            return Ok(book);
        }

        // The guard failed: either the row is missing or the shelf is empty
        if self.exists(id).await? {
            Err(AppError::Unavailable(format!("Book {} not available", id)))
        } else {
            Err(not_found(id))
        }
    }

    async fn increment_quantity(&self, id: &str) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET quantity = quantity + 1
            WHERE id = $1
            RETURNING id, title, author, quantity
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
