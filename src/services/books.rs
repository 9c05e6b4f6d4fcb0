//! Library service: owner-scoped book management

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookListItem, BookListParams, BookQuery, NewBook, UpdateBook},
    repository::{BookStore, UserStore},
};

/// One page of an owner's books plus the parameters that produced it
#[derive(Debug)]
pub struct BookPage {
    pub data: Vec<BookListItem>,
    pub total: i64,
    pub params: BookListParams,
}

#[derive(Clone)]
pub struct BooksService {
    users: Arc<dyn UserStore>,
    books: Arc<dyn BookStore>,
}

impl BooksService {
    pub fn new(users: Arc<dyn UserStore>, books: Arc<dyn BookStore>) -> Self {
        Self { users, books }
    }

    /// Resolve the acting identity to a real account; a token whose account
    /// no longer exists cannot touch any book.
    async fn resolve_owner(&self, username: &str) -> AppResult<()> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authorization("account does not exist".to_string()))?;
        Ok(())
    }

    pub async fn create(&self, owner: &str, book: NewBook) -> AppResult<Book> {
        self.resolve_owner(owner).await?;
        self.books.create(owner, &book).await
    }

    /// One page of the owner's books, honoring pagination, sort, search and
    /// filter parameters.
    pub async fn list(&self, owner: &str, query: &BookQuery) -> AppResult<BookPage> {
        self.resolve_owner(owner).await?;
        let params = query.to_params()?;
        let (data, total) = self.books.search(owner, &params).await?;
        Ok(BookPage {
            data,
            total,
            params,
        })
    }

    /// Fetch one book. A book owned by someone else reads as missing.
    pub async fn get(&self, owner: &str, id: i32) -> AppResult<Book> {
        self.resolve_owner(owner).await?;
        self.books
            .find_by_id_and_owner(id, owner)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    pub async fn update(&self, owner: &str, id: i32, changes: UpdateBook) -> AppResult<()> {
        self.resolve_owner(owner).await?;
        let updated = self.books.update_by_id_and_owner(id, owner, &changes).await?;
        if !updated {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn remove(&self, owner: &str, id: i32) -> AppResult<()> {
        self.resolve_owner(owner).await?;
        let deleted = self.books.delete_by_id_and_owner(id, owner).await?;
        if !deleted {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}
