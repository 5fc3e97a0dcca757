//! Borrow management service

use chrono::{Duration, Utc};

use crate::{
    config::BorrowsConfig,
    error::{AppError, AppResult},
    models::borrow::{BorrowDetails, CreateBorrow},
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowsService {
    repository: Repository,
    config: BorrowsConfig,
}

impl BorrowsService {
    pub fn new(repository: Repository, config: BorrowsConfig) -> Self {
        Self { repository, config }
    }

    /// Get all borrows for a user
    pub async fn get_user_borrows(&self, user_id: i32) -> AppResult<Vec<BorrowDetails>> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;
        self.repository.borrows.get_user_borrows(user_id).await
    }

    /// Borrow a book for a user
    pub async fn borrow_book(&self, request: CreateBorrow) -> AppResult<BorrowDetails> {
        let user = self.repository.users.get_by_id(request.user_id).await?;
        if !user.is_active {
            return Err(AppError::Conflict(
                "Deactivated accounts cannot borrow books".to_string(),
            ));
        }

        let due_date = Utc::now() + Duration::days(self.config.loan_period_days);
        let borrow = self
            .repository
            .borrows
            .create(request.user_id, request.book_id, due_date)
            .await?;

        self.repository.borrows.get_details(borrow.id).await
    }

    /// Return a borrowed book
    pub async fn return_borrow(&self, borrow_id: i32) -> AppResult<BorrowDetails> {
        self.repository.borrows.return_borrow(borrow_id).await
    }
}
