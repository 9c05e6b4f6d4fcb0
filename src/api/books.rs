//! Book management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book::{Book, BookListItem, BookListParams, BookQuery, CreateBook, UpdateBook},
};

use super::AuthenticatedUser;

/// Paginated response envelope
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Pagination metadata echoing the effective query parameters
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_items: i64,
    pub items_per_page: i64,
    pub current_page: i64,
    pub total_pages: i64,
    /// Effective sort as `[column, direction]` pairs
    #[schema(value_type = Vec<Vec<String>>)]
    pub sort_by: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl PageMeta {
    fn new(total_items: i64, params: &BookListParams) -> Self {
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + params.limit - 1) / params.limit
        };

        PageMeta {
            total_items,
            items_per_page: params.limit,
            current_page: params.page,
            total_pages,
            sort_by: vec![(
                params.sort.column.to_string(),
                params.sort.direction.as_sql().to_string(),
            )],
            search: params.search.clone(),
        }
    }
}

/// Create a book owned by the authenticated user
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = request.into_new_book()?;
    let created = state.services.books.create(&claims.sub, book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List the authenticated user's books with pagination, sort, search
/// and filters
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "One page of books", body = PaginatedResponse<BookListItem>),
        (status = 400, description = "Invalid query parameters", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<PaginatedResponse<BookListItem>>> {
    let page = state.services.books.list(&claims.sub, &query).await?;

    Ok(Json(PaginatedResponse {
        meta: PageMeta::new(page.total, &page.params),
        data: page.data,
    }))
}

/// Get one of the authenticated user's books by id
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Book not found or owned by someone else")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get(&claims.sub, id).await?;
    Ok(Json(book))
}

/// Update any subset of a book's mutable fields
#[utoipa::path(
    patch,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated"),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Book not found or owned by someone else")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateBook>,
) -> AppResult<StatusCode> {
    request.validate_complete()?;
    state.services.books.update(&claims.sub, id, request).await?;
    Ok(StatusCode::OK)
}

/// Delete one of the authenticated user's books
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 404, description = "Book not found or owned by someone else")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.books.remove(&claims.sub, id).await?;
    Ok(StatusCode::OK)
}
