//! Reservation lifecycle service

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::reservation::{BookReservationView, Reservation, UserReservationView},
    repository::Repository,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
}

impl ReservationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Reserve a book for a user
    pub async fn reserve(&self, book_id: Uuid, user_id: Uuid) -> AppResult<Reservation> {
        let reservation = self.repository.reservations.reserve(book_id, user_id).await?;
        tracing::info!(%book_id, %user_id, reservation_id = %reservation.id, "Book reserved");
        Ok(reservation)
    }

    /// Return a book previously reserved by the same user
    pub async fn return_book(&self, book_id: Uuid, user_id: Uuid) -> AppResult<Reservation> {
        let reservation = self
            .repository
            .reservations
            .mark_returned(book_id, user_id)
            .await?;
        tracing::info!(%book_id, %user_id, reservation_id = %reservation.id, "Book returned");
        Ok(reservation)
    }

    /// A user's full reservation history joined with book titles.
    ///
    /// The join must not assume the referenced book still resolves.
    pub async fn user_history(&self, user_id: Uuid) -> AppResult<Vec<UserReservationView>> {
        let reservations = self.repository.reservations.find_by_user(user_id).await?;

        let mut views = Vec::with_capacity(reservations.len());
        for reservation in reservations {
            let book = self.repository.books.find_by_id(reservation.book_id).await?;
            views.push(UserReservationView {
                id: reservation.id,
                book_id: reservation.book_id,
                book_title: book.map(|b| b.title),
                reserved_at: reservation.reserved_at,
                returned_at: reservation.returned_at,
            });
        }
        Ok(views)
    }

    /// A book's full reservation history joined with borrower names
    pub async fn book_history(&self, book_id: Uuid) -> AppResult<Vec<BookReservationView>> {
        let reservations = self.repository.reservations.find_by_book(book_id).await?;

        let mut views = Vec::with_capacity(reservations.len());
        for reservation in reservations {
            let user = self.repository.users.find_by_id(reservation.user_id).await?;
            views.push(BookReservationView {
                id: reservation.id,
                user_id: reservation.user_id,
                user_name: user.map(|u| u.name),
                reserved_at: reservation.reserved_at,
                returned_at: reservation.returned_at,
            });
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::models::user::PermissionSet;
    use crate::models::User;
    use crate::repository::{
        MockBookRepository, MockReservationRepository, MockUserRepository, Repository,
    };

    #[tokio::test]
    async fn user_history_tolerates_a_vanished_book() {
        let user_id = Uuid::new_v4();
        let book_id = Uuid::new_v4();
        let reservation = Reservation::open(user_id, book_id, Utc::now());

        let mut reservations = MockReservationRepository::new();
        reservations
            .expect_find_by_user()
            .returning(move |_| Ok(vec![reservation.clone()]));
        let mut books = MockBookRepository::new();
        books.expect_find_by_id().returning(|_| Ok(None));

        let service = ReservationsService::new(Repository {
            users: Arc::new(MockUserRepository::new()),
            books: Arc::new(books),
            reservations: Arc::new(reservations),
        });

        let history = service.user_history(user_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].book_title, None);
    }

    #[tokio::test]
    async fn book_history_shows_deactivated_users_by_stored_name() {
        let book_id = Uuid::new_v4();
        let mut user = User::new(
            "Alice".to_string(),
            "alice@example.com".to_string(),
            "hash".to_string(),
            PermissionSet::default(),
        );
        user.is_active = false;
        let reservation = Reservation::open(user.id, book_id, Utc::now());

        let mut reservations = MockReservationRepository::new();
        reservations
            .expect_find_by_book()
            .returning(move |_| Ok(vec![reservation.clone()]));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));

        let service = ReservationsService::new(Repository {
            users: Arc::new(users),
            books: Arc::new(MockBookRepository::new()),
            reservations: Arc::new(reservations),
        });

        let history = service.book_history(book_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user_name.as_deref(), Some("Alice"));
    }
}
