//! Business logic services

pub mod books;
pub mod borrows;
pub mod users;

use crate::config::{AuthConfig, BorrowsConfig};
use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub books: books::BooksService,
    pub borrows: borrows::BorrowsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        borrows_config: BorrowsConfig,
    ) -> Self {
        Self {
            users: users::UsersService::new(repository.clone(), auth_config),
            books: books::BooksService::new(repository.clone()),
            borrows: borrows::BorrowsService::new(repository, borrows_config),
        }
    }
}
