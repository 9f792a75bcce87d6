//! In-memory store backing the repository traits.
//!
//! A single `RwLock` guards the whole database, so every repository call is
//! one critical section: reserve and return read the availability flag,
//! decide, and write the outcome under the same write guard, which is what
//! keeps the "one open reservation per book" invariant out of reach of
//! interleaved requests.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Book, Reservation, User},
};

use super::{BookRepository, ReservationRepository, UserRepository};

#[derive(Default)]
struct Db {
    users: Vec<User>,
    books: Vec<Book>,
    reservations: Vec<Reservation>,
}

pub struct MemoryStore {
    db: RwLock<Db>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            db: RwLock::new(Db::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: User) -> AppResult<User> {
        let mut db = self.db.write().await;
        db.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let db = self.db.read().await;
        Ok(db.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_active_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let db = self.db.read().await;
        Ok(db.users.iter().find(|u| u.id == id && u.is_active).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let db = self.db.read().await;
        Ok(db.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_active_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let db = self.db.read().await;
        Ok(db
            .users
            .iter()
            .find(|u| u.email == email && u.is_active)
            .cloned())
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let mut db = self.db.write().await;
        let stored = db
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        *stored = user.clone();
        Ok(user)
    }

    async fn count(&self) -> AppResult<usize> {
        let db = self.db.read().await;
        Ok(db.users.len())
    }
}

#[async_trait]
impl BookRepository for MemoryStore {
    async fn insert(&self, book: Book) -> AppResult<Book> {
        let mut db = self.db.write().await;
        db.books.push(book.clone());
        Ok(book)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let db = self.db.read().await;
        Ok(db.books.iter().find(|b| b.id == id).cloned())
    }

    async fn find_active_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let db = self.db.read().await;
        Ok(db.books.iter().find(|b| b.id == id && b.is_active).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        let db = self.db.read().await;
        Ok(db.books.clone())
    }

    async fn update(&self, book: Book) -> AppResult<Book> {
        let mut db = self.db.write().await;
        let stored = db
            .books
            .iter_mut()
            .find(|b| b.id == book.id)
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
        *stored = book.clone();
        Ok(book)
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn reserve(&self, book_id: Uuid, user_id: Uuid) -> AppResult<Reservation> {
        let mut db = self.db.write().await;

        let book_idx = db
            .books
            .iter()
            .position(|b| b.id == book_id && b.is_active)
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        if !db.books[book_idx].available {
            return Err(AppError::Conflict("Book is already reserved".to_string()));
        }

        let now = Utc::now();
        db.books[book_idx].available = false;
        db.books[book_idx].updated_at = now;

        let reservation = Reservation::open(user_id, book_id, now);
        db.reservations.push(reservation.clone());

        Ok(reservation)
    }

    async fn mark_returned(&self, book_id: Uuid, user_id: Uuid) -> AppResult<Reservation> {
        let mut db = self.db.write().await;

        let book_idx = db
            .books
            .iter()
            .position(|b| b.id == book_id && b.is_active)
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        let res_idx = db
            .reservations
            .iter()
            .position(|r| r.book_id == book_id && r.user_id == user_id && r.is_open())
            .ok_or_else(|| {
                AppError::InvalidState("No open reservation for this book and user".to_string())
            })?;

        let now = Utc::now();
        db.reservations[res_idx].returned_at = Some(now);
        db.books[book_idx].available = true;
        db.books[book_idx].updated_at = now;

        Ok(db.reservations[res_idx].clone())
    }

    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Reservation>> {
        let db = self.db.read().await;
        Ok(db
            .reservations
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_book(&self, book_id: Uuid) -> AppResult<Vec<Reservation>> {
        let db = self.db.read().await;
        Ok(db
            .reservations
            .iter()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect())
    }
}
