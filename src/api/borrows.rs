//! Borrow management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::borrow::{BorrowDetails, CreateBorrow},
};

use super::AuthenticatedUser;

/// Return response with borrow details
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    /// Borrow details
    pub borrow: BorrowDetails,
}

/// Get borrows for a specific user
#[utoipa::path(
    get,
    path = "/users/{id}/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's borrows", body = Vec<BorrowDetails>),
        (status = 403, description = "Not the caller's own record and not admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<BorrowDetails>>> {
    // Users may read their own history; anything else requires admin
    if claims.user_id != user_id {
        claims.require_admin()?;
    }

    let borrows = state.services.borrows.get_user_borrows(user_id).await?;
    Ok(Json(borrows))
}

/// Borrow a book for a user (admin only)
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = CreateBorrow,
    responses(
        (status = 201, description = "Book borrowed", body = BorrowDetails),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "User or book not found"),
        (status = 409, description = "No copies available")
    )
)]
pub async fn create_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrow>,
) -> AppResult<(StatusCode, Json<BorrowDetails>)> {
    claims.require_admin()?;

    let borrow = state.services.borrows.borrow_book(request).await?;
    Ok((StatusCode::CREATED, Json(borrow)))
}

/// Return a borrowed book (admin only)
#[utoipa::path(
    post,
    path = "/borrows/{id}/return",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Borrow not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(borrow_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    claims.require_admin()?;

    let borrow = state.services.borrows.return_borrow(borrow_id).await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        borrow,
    }))
}
