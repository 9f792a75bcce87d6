//! Catalog management service

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookPage, BookQuery, BookSummary, CreateBook, Pagination, UpdateBook},
    repository::Repository,
};

const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Add a book to the catalog
    pub async fn create(&self, request: CreateBook) -> AppResult<Book> {
        let book = self.repository.books.insert(Book::new(request)).await?;
        tracing::info!(book_id = %book.id, title = %book.title, "Book created");
        Ok(book)
    }

    /// Single-item lookup, active-only unless opted in
    pub async fn get(&self, id: Uuid, include_inactive: bool) -> AppResult<Book> {
        let book = if include_inactive {
            self.repository.books.find_by_id(id).await?
        } else {
            self.repository.books.find_active_by_id(id).await?
        };
        book.ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Filtered, paginated list projected to id + title
    pub async fn list(&self, query: &BookQuery) -> AppResult<BookPage> {
        let mut books = self.repository.books.list().await?;

        if !query.include_inactive.unwrap_or(false) {
            books.retain(|b| b.is_active);
        }
        if let Some(genre) = &query.genre {
            books.retain(|b| b.genre == *genre);
        }
        if let Some(publisher) = &query.publisher {
            books.retain(|b| b.publisher == *publisher);
        }
        if let Some(author) = &query.author {
            books.retain(|b| b.author == *author);
        }
        if let Some(title) = &query.title {
            books.retain(|b| b.title.contains(title.as_str()));
        }
        if let Some(raw) = &query.publish_date {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                AppError::Validation(format!("Invalid publish_date filter: {}", raw))
            })?;
            books.retain(|b| b.publish_date == date);
        }
        if let Some(available) = query.available {
            books.retain(|b| b.available == available);
        }

        let page = query.page.filter(|p| *p >= 1).unwrap_or(1);
        let page_size = query
            .page_size
            .filter(|s| *s >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let total_items = books.len() as i64;
        let total_pages = ((total_items + page_size - 1) / page_size).max(1);

        let start = ((page - 1) * page_size) as usize;
        let data = books
            .iter()
            .skip(start)
            .take(page_size as usize)
            .map(BookSummary::from)
            .collect();

        Ok(BookPage {
            data,
            pagination: Pagination {
                page,
                page_size,
                total_pages,
                total_items,
            },
        })
    }

    /// Partial patch on an active book; provided fields overwrite
    pub async fn update(&self, id: Uuid, update: UpdateBook) -> AppResult<Book> {
        let mut book = self
            .repository
            .books
            .find_active_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        if let Some(title) = update.title.filter(|s| !s.is_empty()) {
            book.title = title;
        }
        if let Some(author) = update.author.filter(|s| !s.is_empty()) {
            book.author = author;
        }
        if let Some(genre) = update.genre.filter(|s| !s.is_empty()) {
            book.genre = genre;
        }
        if let Some(publisher) = update.publisher.filter(|s| !s.is_empty()) {
            book.publisher = publisher;
        }
        if let Some(publish_date) = update.publish_date {
            book.publish_date = publish_date;
        }
        if let Some(available) = update.available {
            book.available = available;
        }
        book.updated_at = Utc::now();

        self.repository.books.update(book).await
    }

    /// Terminal soft-delete, allowed even while the book is reserved
    pub async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        let mut book = self
            .repository
            .books
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        book.is_active = false;
        book.updated_at = Utc::now();
        self.repository.books.update(book).await?;

        tracing::info!(book_id = %id, "Book deactivated");
        Ok(())
    }
}
