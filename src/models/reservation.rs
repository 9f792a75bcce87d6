//! Reservation model and history views

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Custody record linking a user to a book.
///
/// `returned_at = None` means the reservation is open; at most one open
/// reservation may exist per book. Once returned, the record is immutable
/// and kept as history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub reserved_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn open(user_id: Uuid, book_id: Uuid, reserved_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            book_id,
            reserved_at,
            returned_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// A user's reservation joined with the book title for display.
///
/// `book_title` is `None` when the referenced book no longer resolves.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserReservationView {
    pub id: Uuid,
    pub book_id: Uuid,
    pub book_title: Option<String>,
    pub reserved_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

/// A book's reservation joined with the borrower name for display.
///
/// `user_name` is `None` when the referenced user no longer resolves.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookReservationView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub reserved_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}
