//! Business logic services

pub mod auth;
pub mod books;

use std::sync::Arc;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub books: books::BooksService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        let users = Arc::new(repository.users.clone());
        let books = Arc::new(repository.books);

        Self {
            auth: auth::AuthService::new(users.clone(), auth_config),
            books: books::BooksService::new(users, books),
        }
    }
}
