//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Columns a listing may sort on, select, or filter by
pub const SORTABLE_COLUMNS: &[&str] = &[
    "id",
    "title",
    "author",
    "summary",
    "total_page",
    "status",
    "created_at",
    "updated_at",
];

/// Columns covered by free-text search
pub const SEARCHABLE_COLUMNS: &[&str] = &["title", "author", "summary"];

/// Reading status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Unread,
    InReading,
    Read,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Unread => "unread",
            BookStatus::InReading => "in_reading",
            BookStatus::Read => "read",
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(BookStatus::Unread),
            "in_reading" => Ok(BookStatus::InReading),
            "read" => Ok(BookStatus::Read),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

// SQLx conversion for BookStatus (stored as text)
impl sqlx::Type<Postgres> for BookStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BookStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

/// Full book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub summary: Option<String>,
    pub total_page: i32,
    pub year: String,
    pub status: BookStatus,
    /// Owning username; never serialized, ownership is enforced in queries
    #[serde(skip_serializing)]
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Book representation for listings: the enumerated column set only
/// (year and owner are not part of the listing projection)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookListItem {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub summary: Option<String>,
    pub total_page: i32,
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 3, message = "title must be longer than or equal to 3 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "author should not be empty"))]
    pub author: Option<String>,
    pub summary: Option<String>,
    #[validate(range(min = 1, message = "total_page must not be less than 1"))]
    pub total_page: Option<i32>,
    #[validate(length(equal = 4, message = "year must be exactly 4 characters"))]
    pub year: Option<String>,
}

impl CreateBook {
    /// Validate field constraints plus presence of all required fields.
    pub fn validate_complete(&self) -> Result<(), AppError> {
        let mut messages = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => match AppError::from(errors) {
                AppError::Validation(messages) => messages,
                _ => Vec::new(),
            },
        };

        if self.title.is_none() {
            messages.push("title should not be empty".to_string());
        }
        if self.author.is_none() {
            messages.push("author should not be empty".to_string());
        }
        if self.total_page.is_none() {
            messages.push("total_page should not be empty".to_string());
        }
        if self.year.is_none() {
            messages.push("year should not be empty".to_string());
        }

        if messages.is_empty() {
            Ok(())
        } else {
            messages.sort();
            messages.dedup();
            Err(AppError::Validation(messages))
        }
    }

    /// Validate and convert into a complete book ready for insertion.
    pub fn into_new_book(self) -> AppResult<NewBook> {
        self.validate_complete()?;
        match (self.title, self.author, self.total_page, self.year) {
            (Some(title), Some(author), Some(total_page), Some(year)) => Ok(NewBook {
                title,
                author,
                summary: self.summary,
                total_page,
                year,
            }),
            _ => Err(AppError::Internal(
                "book fields missing after validation".to_string(),
            )),
        }
    }
}

/// A fully validated book ready for insertion
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub summary: Option<String>,
    pub total_page: i32,
    pub year: String,
}

/// Update book request; any subset of the mutable fields
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 3, message = "title must be longer than or equal to 3 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "author should not be empty"))]
    pub author: Option<String>,
    pub summary: Option<String>,
    #[validate(range(min = 1, message = "total_page must not be less than 1"))]
    pub total_page: Option<i32>,
    #[validate(length(equal = 4, message = "year must be exactly 4 characters"))]
    pub year: Option<String>,
    pub status: Option<BookStatus>,
}

impl UpdateBook {
    pub fn validate_complete(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }

    /// True when no field is supplied; such a patch must not touch the row
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.summary.is_none()
            && self.total_page.is_none()
            && self.year.is_none()
            && self.status.is_none()
    }
}

/// Sort direction for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A validated sort specification over the sortable column set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Parse a `column:DIRECTION` pair, rejecting columns outside the
    /// sortable set.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let (column, direction) = match raw.split_once(':') {
            Some((column, direction)) => (column, direction),
            None => (raw, "ASC"),
        };

        let column = SORTABLE_COLUMNS
            .iter()
            .find(|c| **c == column)
            .copied()
            .ok_or_else(|| {
                AppError::Validation(vec![format!("sortBy column is not allowed: {}", column)])
            })?;

        let direction = match direction.to_uppercase().as_str() {
            "ASC" => SortDirection::Asc,
            "DESC" => SortDirection::Desc,
            other => {
                return Err(AppError::Validation(vec![format!(
                    "sortBy direction is not allowed: {}",
                    other
                )]))
            }
        };

        Ok(SortSpec { column, direction })
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec {
            column: "id",
            direction: SortDirection::Desc,
        }
    }
}

/// Book listing query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// `column:ASC|DESC` over the sortable column set
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    /// Comma-separated subset of the searchable columns
    #[serde(rename = "searchBy")]
    pub search_by: Option<String>,
    /// Case-insensitive substring search over the searchable columns
    pub search: Option<String>,
    #[serde(rename = "filter.id")]
    pub filter_id: Option<i32>,
    #[serde(rename = "filter.title")]
    pub filter_title: Option<String>,
    #[serde(rename = "filter.author")]
    pub filter_author: Option<String>,
    #[serde(rename = "filter.summary")]
    pub filter_summary: Option<String>,
    #[serde(rename = "filter.total_page")]
    pub filter_total_page: Option<i32>,
    #[serde(rename = "filter.status")]
    pub filter_status: Option<BookStatus>,
    #[serde(rename = "filter.created_at")]
    pub filter_created_at: Option<DateTime<Utc>>,
    #[serde(rename = "filter.updated_at")]
    pub filter_updated_at: Option<DateTime<Utc>>,
}

impl BookQuery {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn sort(&self) -> AppResult<SortSpec> {
        match &self.sort_by {
            Some(raw) => SortSpec::parse(raw),
            None => Ok(SortSpec::default()),
        }
    }

    /// Resolve the raw query into validated listing parameters.
    pub fn to_params(&self) -> AppResult<BookListParams> {
        Ok(BookListParams {
            page: self.page(),
            limit: self.limit(),
            sort: self.sort()?,
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            search_columns: self.search_columns()?,
            filter_id: self.filter_id,
            filter_title: self.filter_title.clone(),
            filter_author: self.filter_author.clone(),
            filter_summary: self.filter_summary.clone(),
            filter_total_page: self.filter_total_page,
            filter_status: self.filter_status,
            filter_created_at: self.filter_created_at,
            filter_updated_at: self.filter_updated_at,
        })
    }

    /// Columns the free-text search applies to, narrowed by `searchBy`
    pub fn search_columns(&self) -> AppResult<Vec<&'static str>> {
        match &self.search_by {
            None => Ok(SEARCHABLE_COLUMNS.to_vec()),
            Some(raw) => {
                let mut columns = Vec::new();
                for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    let column = SEARCHABLE_COLUMNS
                        .iter()
                        .find(|c| **c == part)
                        .copied()
                        .ok_or_else(|| {
                            AppError::Validation(vec![format!(
                                "searchBy column is not allowed: {}",
                                part
                            )])
                        })?;
                    columns.push(column);
                }
                if columns.is_empty() {
                    Ok(SEARCHABLE_COLUMNS.to_vec())
                } else {
                    Ok(columns)
                }
            }
        }
    }
}

/// Validated listing parameters: whitelisted sort/search columns only
#[derive(Debug, Clone)]
pub struct BookListParams {
    pub page: i64,
    pub limit: i64,
    pub sort: SortSpec,
    pub search: Option<String>,
    pub search_columns: Vec<&'static str>,
    pub filter_id: Option<i32>,
    pub filter_title: Option<String>,
    pub filter_author: Option<String>,
    pub filter_summary: Option<String>,
    pub filter_total_page: Option<i32>,
    pub filter_status: Option<BookStatus>,
    pub filter_created_at: Option<DateTime<Utc>>,
    pub filter_updated_at: Option<DateTime<Utc>>,
}

impl BookListParams {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}
