//! Books repository for database operations
//!
//! Every query here carries the owner predicate; a book belonging to
//! another user is indistinguishable from a missing row.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::AppResult,
    models::book::{Book, BookListItem, BookListParams, NewBook, UpdateBook},
    repository::BookStore,
};

const BOOK_COLUMNS: &str = "id, title, author, summary, total_page, year, status, owner, created_at, updated_at";

/// Listing projection: the enumerated sortable column set
const LIST_COLUMNS: &str = "id, title, author, summary, total_page, status, created_at, updated_at";

/// Escape LIKE metacharacters so a search term matches literally
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append the owner scope, filters and free-text search conditions.
    /// Column names come from the validated whitelist; values are bound.
    fn push_conditions<'a>(
        builder: &mut QueryBuilder<'a, Postgres>,
        owner: &'a str,
        params: &'a BookListParams,
    ) {
        builder.push(" WHERE owner = ");
        builder.push_bind(owner);

        if let Some(id) = params.filter_id {
            builder.push(" AND id = ");
            builder.push_bind(id);
        }

        if let Some(ref title) = params.filter_title {
            builder.push(" AND title = ");
            builder.push_bind(title);
        }

        if let Some(ref author) = params.filter_author {
            builder.push(" AND author = ");
            builder.push_bind(author);
        }

        if let Some(ref summary) = params.filter_summary {
            builder.push(" AND summary = ");
            builder.push_bind(summary);
        }

        if let Some(total_page) = params.filter_total_page {
            builder.push(" AND total_page = ");
            builder.push_bind(total_page);
        }

        if let Some(status) = params.filter_status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }

        if let Some(created_at) = params.filter_created_at {
            builder.push(" AND created_at = ");
            builder.push_bind(created_at);
        }

        if let Some(updated_at) = params.filter_updated_at {
            builder.push(" AND updated_at = ");
            builder.push_bind(updated_at);
        }

        if let Some(ref search) = params.search {
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            builder.push(" AND (");
            for (i, column) in params.search_columns.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder.push(format!("LOWER({}) LIKE ", column));
                builder.push_bind(pattern.clone());
                builder.push(" ESCAPE '\\'");
            }
            builder.push(")");
        }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn create(&self, owner: &str, book: &NewBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, author, summary, total_page, year, owner)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.summary.as_deref())
        .bind(book.total_page)
        .bind(&book.year)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Search the owner's books with pagination
    async fn search(
        &self,
        owner: &str,
        params: &BookListParams,
    ) -> AppResult<(Vec<BookListItem>, i64)> {
        // Count total matches
        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books");
        Self::push_conditions(&mut count_builder, owner, params);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        // Fetch the requested page
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM books", LIST_COLUMNS));
        Self::push_conditions(&mut builder, owner, params);

        // Sort column and direction are validated against the whitelist;
        // a secondary id sort keeps page boundaries deterministic
        builder.push(format!(
            " ORDER BY {} {} NULLS LAST",
            params.sort.column,
            params.sort.direction.as_sql()
        ));
        if params.sort.column != "id" {
            builder.push(", id DESC");
        }

        builder.push(" LIMIT ");
        builder.push_bind(params.limit);
        builder.push(" OFFSET ");
        builder.push_bind(params.offset());

        let books = builder
            .build_query_as::<BookListItem>()
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    async fn find_by_id_and_owner(&self, id: i32, owner: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            SELECT {} FROM books WHERE id = $1 AND owner = $2
            "#,
            BOOK_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    async fn update_by_id_and_owner(
        &self,
        id: i32,
        owner: &str,
        changes: &UpdateBook,
    ) -> AppResult<bool> {
        // A patch with no fields must not rewrite the row (or its
        // updated_at); only the existence check remains
        if changes.is_empty() {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM books WHERE id = $1 AND owner = $2)",
            )
            .bind(id)
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;

            return Ok(exists);
        }

        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = COALESCE($3, title),
                author = COALESCE($4, author),
                summary = COALESCE($5, summary),
                total_page = COALESCE($6, total_page),
                year = COALESCE($7, year),
                status = COALESCE($8, status),
                updated_at = NOW()
            WHERE id = $1 AND owner = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(changes.title.as_deref())
        .bind(changes.author.as_deref())
        .bind(changes.summary.as_deref())
        .bind(changes.total_page)
        .bind(changes.year.as_deref())
        .bind(changes.status)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_id_and_owner(&self, id: i32, owner: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
