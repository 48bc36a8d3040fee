//! Business logic services

pub mod auth;
pub mod books;
pub mod users;

use std::sync::Arc;

use crate::{config::AuthConfig, repository::Repository, storage::FileStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub books: books::BooksService,
    pub users: users::UsersService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository and file store
    pub fn new(repository: Repository, auth_config: AuthConfig, files: Arc<dyn FileStore>) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            books: books::BooksService::new(repository.clone(), files),
            users: users::UsersService::new(repository.clone()),
            repository,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }
}
