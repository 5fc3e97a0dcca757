//! Users repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{RegisterRequest, Role, User, UserQuery, UserShort},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by ID, returning None when absent.
    /// Backs the read-after-write verification performed by the service.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user by email (case-insensitive)
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find an existing user holding either identity; used as the duplicate
    /// pre-check before registration. Email matches case-insensitively,
    /// username exactly.
    pub async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1) OR username = $2",
        )
        .bind(email)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Insert a new user and return its assigned ID.
    /// A unique-index violation on username or email becomes `Duplicate`:
    /// the indexes are the final authority under concurrent registration.
    pub async fn create(
        &self,
        user: &RegisterRequest,
        password_hash: &str,
        role: Role,
    ) -> AppResult<i32> {
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO users (
                username, email, password_hash, first_name, last_name, role,
                phone_number, addr_street, addr_city, addr_state, addr_zip_code,
                is_active, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, TRUE, $12, $12
            ) RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(role)
        .bind(&user.phone_number)
        .bind(&user.addr_street)
        .bind(&user.addr_city)
        .bind(&user.addr_state)
        .bind(&user.addr_zip_code)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::Duplicate(
                "User with this email or username already exists".to_string(),
            ),
            other => AppError::Database(other),
        })?;

        Ok(id)
    }

    /// Search users with pagination
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<UserShort>, i64)> {
        let page = query.page.unwrap_or(1);
        let per_page = query.per_page.unwrap_or(20);
        let offset = (page - 1) * per_page;

        let (where_clause, name_param) = match query.name {
            Some(ref name) => (
                "WHERE (LOWER(u.username) LIKE $1 OR LOWER(u.first_name) LIKE $1 OR LOWER(u.last_name) LIKE $1)",
                Some(format!("%{}%", name.to_lowercase())),
            ),
            None => ("", None),
        };

        let count_query = format!("SELECT COUNT(*) FROM users u {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(ref param) = name_param {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.role, u.is_active,
                   (SELECT COUNT(*) FROM borrows b WHERE b.user_id = u.id AND b.returned_at IS NULL) AS nb_active_borrows
            FROM users u
            {}
            ORDER BY u.username
            LIMIT {} OFFSET {}
            "#,
            where_clause, per_page, offset
        );

        let mut select_builder = sqlx::query_as::<_, UserShort>(&select_query);
        if let Some(ref param) = name_param {
            select_builder = select_builder.bind(param);
        }
        let users = select_builder.fetch_all(&self.pool).await?;

        Ok((users, total))
    }

    /// Activate or deactivate a user account
    pub async fn set_active(&self, id: i32, active: bool) -> AppResult<User> {
        let now = Utc::now();

        let updated = sqlx::query("UPDATE users SET is_active = $1, updated_at = $2 WHERE id = $3")
            .bind(active)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        self.get_by_id(id).await
    }
}
