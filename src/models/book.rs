//! Book (catalog) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Catalog entry.
///
/// `available` is a stored cache of "no open reservation exists for this
/// book" and is kept consistent with every reservation transition.
/// `is_active = false` is a terminal soft-delete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub publisher: String,
    pub publish_date: NaiveDate,
    pub available: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn new(create: CreateBook) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: create.title,
            author: create.author,
            genre: create.genre,
            publisher: create.publisher,
            publish_date: create.publish_date,
            available: create.available.unwrap_or(true),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "Genre is required"))]
    pub genre: String,
    #[validate(length(min = 1, message = "Publisher is required"))]
    pub publisher: String,
    pub publish_date: NaiveDate,
    pub available: Option<bool>,
}

/// Update book request (partial patch)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub available: Option<bool>,
}

/// Book list query parameters.
///
/// Pagination values that are absent or fail to parse fall back to their
/// defaults instead of rejecting the request, as do non-boolean flag values.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BookQuery {
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub author: Option<String>,
    /// Substring match
    pub title: Option<String>,
    /// Exact date match, `YYYY-MM-DD`
    pub publish_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub available: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub include_inactive: Option<bool>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub page_size: Option<i64>,
}

/// Single-book lookup parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct GetBookParams {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub include_inactive: Option<bool>,
}

/// Projection used by the list endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

/// Paginated book list response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookPage {
    pub data: Vec<BookSummary>,
    pub pagination: Pagination,
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| match s.as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_book_is_active_and_available_by_default() {
        let book = Book::new(CreateBook {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            genre: "Sci-Fi".to_string(),
            publisher: "Chilton".to_string(),
            publish_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            available: None,
        });
        assert!(book.available);
        assert!(book.is_active);
    }

    #[test]
    fn availability_override_is_honored() {
        let book = Book::new(CreateBook {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            genre: "Sci-Fi".to_string(),
            publisher: "Chilton".to_string(),
            publish_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            available: Some(false),
        });
        assert!(!book.available);
    }

    #[test]
    fn lenient_query_values_fall_back() {
        let query: BookQuery =
            serde_urlencoded::from_str("page=abc&page_size=&available=maybe").unwrap();
        assert_eq!(query.page, None);
        assert_eq!(query.page_size, None);
        assert_eq!(query.available, None);
    }

    #[test]
    fn numeric_query_values_parse() {
        let query: BookQuery =
            serde_urlencoded::from_str("page=3&page_size=25&available=true&include_inactive=false")
                .unwrap();
        assert_eq!(query.page, Some(3));
        assert_eq!(query.page_size, Some(25));
        assert_eq!(query.available, Some(true));
        assert_eq!(query.include_inactive, Some(false));
    }
}
