//! Repository layer for database operations
//!
//! Each entity is persisted behind an explicit store trait; the ownership
//! predicate for books lives inside the store calls, never in callers.

pub mod books;
pub mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookListItem, BookListParams, NewBook, UpdateBook},
        user::{NewUser, ProfileChanges, User},
    },
};

/// Persistence operations for user records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Insert a new account. A store-level unique violation on the username
    /// is translated into a Conflict error.
    async fn create(&self, user: &NewUser) -> AppResult<()>;

    /// Merge the supplied fields onto the existing record and return the
    /// refreshed user.
    async fn update_profile(&self, username: &str, changes: &ProfileChanges) -> AppResult<User>;
}

/// Persistence operations for book records, always owner-scoped
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn create(&self, owner: &str, book: &NewBook) -> AppResult<Book>;

    /// One page of the owner's books plus the owner's total match count
    async fn search(
        &self,
        owner: &str,
        params: &BookListParams,
    ) -> AppResult<(Vec<BookListItem>, i64)>;

    async fn find_by_id_and_owner(&self, id: i32, owner: &str) -> AppResult<Option<Book>>;

    /// Merge the supplied fields onto the book; returns false when no row
    /// matched `(id, owner)`.
    async fn update_by_id_and_owner(
        &self,
        id: i32,
        owner: &str,
        changes: &UpdateBook,
    ) -> AppResult<bool>;

    /// Returns false when no row matched `(id, owner)`.
    async fn delete_by_id_and_owner(&self, id: i32, owner: &str) -> AppResult<bool>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub books: books::BooksRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            pool,
        }
    }
}
