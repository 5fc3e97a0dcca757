//! Borrows repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookShort,
        borrow::{Borrow, BorrowDetails},
    },
};

/// Internal row structure for borrow queries joined with books
#[derive(Debug, FromRow)]
struct BorrowDetailsRow {
    id: i32,
    user_id: i32,
    book_id: i32,
    title: String,
    author: String,
    isbn: Option<String>,
    issued_at: DateTime<Utc>,
    due_date: DateTime<Utc>,
    returned_at: Option<DateTime<Utc>>,
}

impl From<BorrowDetailsRow> for BorrowDetails {
    fn from(row: BorrowDetailsRow) -> Self {
        let returned = row.returned_at.is_some();
        BorrowDetails {
            id: row.id,
            user_id: row.user_id,
            book: BookShort {
                id: row.book_id,
                title: row.title,
                author: row.author,
                isbn: row.isbn,
            },
            issued_at: row.issued_at,
            due_date: row.due_date,
            returned,
            returned_at: row.returned_at,
            is_overdue: !returned && row.due_date < Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a borrow, taking one available copy.
    /// The guarded decrement and the insert commit together.
    pub async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        due_date: DateTime<Utc>,
    ) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;

        if !exists {
            return Err(AppError::NotFound(format!(
                "Book with id {} not found",
                book_id
            )));
        }

        let taken = sqlx::query(
            r#"
            UPDATE books SET available_copies = available_copies - 1, updated_at = NOW()
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        if taken.rows_affected() == 0 {
            return Err(AppError::NoCopiesAvailable);
        }

        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            INSERT INTO borrows (user_id, book_id, issued_at, due_date)
            VALUES ($1, $2, NOW(), $3)
            RETURNING id, user_id, book_id, issued_at, due_date, returned_at
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(borrow)
    }

    /// Mark a borrow as returned and restore the copy.
    /// A second return of the same borrow is a conflict.
    pub async fn return_borrow(&self, id: i32) -> AppResult<BorrowDetails> {
        let mut tx = self.pool.begin().await?;

        let returned = sqlx::query_as::<_, Borrow>(
            r#"
            UPDATE borrows SET returned_at = NOW()
            WHERE id = $1 AND returned_at IS NULL
            RETURNING id, user_id, book_id, issued_at, due_date, returned_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let borrow = match returned {
            Some(borrow) => borrow,
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM borrows WHERE id = $1)")
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await?;
                if exists {
                    return Err(AppError::AlreadyReturned);
                }
                return Err(AppError::NotFound(format!(
                    "Borrow with id {} not found",
                    id
                )));
            }
        };

        sqlx::query(
            r#"
            UPDATE books
            SET available_copies = LEAST(available_copies + 1, total_copies), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(borrow.book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_details(borrow.id).await
    }

    /// Get a borrow with book details
    pub async fn get_details(&self, id: i32) -> AppResult<BorrowDetails> {
        let row = sqlx::query_as::<_, BorrowDetailsRow>(
            r#"
            SELECT bo.id, bo.user_id, bo.book_id, bk.title, bk.author, bk.isbn,
                   bo.issued_at, bo.due_date, bo.returned_at
            FROM borrows bo
            JOIN books bk ON bk.id = bo.book_id
            WHERE bo.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrow with id {} not found", id)))?;

        Ok(row.into())
    }

    /// Get all borrows for a user, most recent first
    pub async fn get_user_borrows(&self, user_id: i32) -> AppResult<Vec<BorrowDetails>> {
        let rows = sqlx::query_as::<_, BorrowDetailsRow>(
            r#"
            SELECT bo.id, bo.user_id, bo.book_id, bk.title, bk.author, bk.isbn,
                   bo.issued_at, bo.due_date, bo.returned_at
            FROM borrows bo
            JOIN books bk ON bk.id = bo.book_id
            WHERE bo.user_id = $1
            ORDER BY bo.issued_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BorrowDetails::from).collect())
    }
}
