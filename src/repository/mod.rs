//! Storage abstraction for users, books, and reservations.
//!
//! Business rules depend on these traits, never on a concrete collection;
//! a transactional store can be swapped in behind them without touching the
//! services.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, Reservation, User},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User) -> AppResult<User>;
    /// Lookup ignoring the active flag
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_active_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    /// Lookup ignoring the active flag; email uniqueness is global
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn find_active_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// Replace the stored record with the same id
    async fn update(&self, user: User) -> AppResult<User>;
    async fn count(&self) -> AppResult<usize>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn insert(&self, book: Book) -> AppResult<Book>;
    /// Lookup ignoring the active flag
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;
    async fn find_active_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;
    /// All records in insertion order, inactive included
    async fn list(&self) -> AppResult<Vec<Book>>;
    /// Replace the stored record with the same id
    async fn update(&self, book: Book) -> AppResult<Book>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Atomically create an open reservation and flip the book unavailable.
    ///
    /// The availability flag acts as a single-slot lock on the book: the
    /// read-decide-write must not interleave with another mutation of the
    /// same book. Fails with `NotFound` when the book is missing or
    /// inactive, `Conflict` when an open reservation already exists.
    async fn reserve(&self, book_id: Uuid, user_id: Uuid) -> AppResult<Reservation>;

    /// Atomically close the open reservation held by `user_id` on
    /// `book_id` and flip the book available again.
    ///
    /// Fails with `NotFound` when the book is missing or inactive,
    /// `InvalidState` when the pair holds no open reservation (including a
    /// book reserved by somebody else).
    async fn mark_returned(&self, book_id: Uuid, user_id: Uuid) -> AppResult<Reservation>;

    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Reservation>>;
    async fn find_by_book(&self, book_id: Uuid) -> AppResult<Vec<Reservation>>;
}

/// Main repository struct bundling the per-entity stores
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn UserRepository>,
    pub books: Arc<dyn BookRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
}

impl Repository {
    /// Create a repository backed by a single in-memory store
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::new());
        Self {
            users: store.clone(),
            books: store.clone(),
            reservations: store,
        }
    }
}
