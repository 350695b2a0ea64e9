//! Record store for student rows.
//!
//! A store owns id assignment and `created_at` stamping. Absence is reported
//! as `None`/`false`; turning that into a not-found failure is left to the
//! caller.

pub mod memory;
pub mod pg;

use async_trait::async_trait;

use crate::err::Error;
use crate::models::{Student, StudentFields};

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Which columns a substring search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Ten,
    ThanhPho,
    ThanhPhoOrTen,
}

#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn insert(&self, fields: StudentFields) -> Result<Student, Error>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Student>, Error>;

    async fn exists_by_id(&self, id: i64) -> Result<bool, Error>;

    /// Replaces every field except `id` and `created_at`.
    async fn update(&self, id: i64, fields: StudentFields) -> Result<Option<Student>, Error>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, Error>;

    /// All rows by ascending id.
    async fn list_all(&self) -> Result<Vec<Student>, Error>;

    async fn count(&self) -> Result<i64, Error>;

    /// Rows ordered by `created_at` descending then `id` ascending, skipping
    /// `offset` and returning at most `limit`.
    async fn list_window(&self, offset: i64, limit: i64) -> Result<Vec<Student>, Error>;

    /// Case-insensitive substring match on `field`, by ascending id. A missing
    /// city counts as the empty string.
    async fn search(&self, field: SearchField, fragment: &str) -> Result<Vec<Student>, Error>;
}
