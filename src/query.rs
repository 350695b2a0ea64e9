use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::err::Error;
use crate::models::{Student, StudentDto, StudentFields};
use crate::store::{SearchField, StudentStore};

pub const DEFAULT_PAGE: i64 = 0;
pub const DEFAULT_SIZE: i64 = 5;
pub const MAX_SIZE: i64 = 1000;

/// Offset paging as it arrives on the query string.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl PageRequest {
    #[cfg(test)]
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }

    /// Negative pages and sizes outside `1..=MAX_SIZE` are rejected, never clamped.
    pub fn resolve(self) -> Result<(i64, i64), Error> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let size = self.size.unwrap_or(DEFAULT_SIZE);
        let mut errors = Vec::new();
        if page < 0 {
            errors.push("page must not be negative".to_string());
        }
        if size < 1 {
            errors.push("size must be at least 1".to_string());
        } else if size > MAX_SIZE {
            errors.push(format!("size must be at most {}", MAX_SIZE));
        }
        if errors.is_empty() {
            Ok((page, size))
        } else {
            Err(Error::ValidationFailed { errors })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub students: Vec<Student>,
    pub total_pages: i64,
}

pub fn total_pages(total: i64, size: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (total + size - 1) / size
    }
}

/// Listing, searching and mutation over a shared [`StudentStore`].
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn StudentStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn StudentStore>) -> Self {
        Self { store }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn validate(dto: StudentDto) -> Result<StudentFields, Error> {
        dto.validate(Self::today())
            .map_err(|errors| Error::ValidationFailed { errors })
    }

    pub async fn create(&self, dto: StudentDto) -> Result<Student, Error> {
        let fields = Self::validate(dto)?;
        self.store.insert(fields).await
    }

    pub async fn get(&self, id: i64) -> Result<Student, Error> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::student_not_found(id))
    }

    pub async fn update(&self, id: i64, dto: StudentDto) -> Result<Student, Error> {
        let fields = Self::validate(dto)?;
        if !self.store.exists_by_id(id).await? {
            return Err(Error::student_not_found(id));
        }
        self.store
            .update(id, fields)
            .await?
            .ok_or_else(|| Error::student_not_found(id))
    }

    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        if self.store.delete(id).await? {
            Ok(())
        } else {
            Err(Error::student_not_found(id))
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Student>, Error> {
        self.store.list_all().await
    }

    /// Newest first; ties on `created_at` fall back to ascending id.
    pub async fn list_page(&self, request: PageRequest) -> Result<Page, Error> {
        let (page, size) = request.resolve()?;
        let total = self.store.count().await?;
        let students = match page.checked_mul(size) {
            Some(offset) if offset < total => self.store.list_window(offset, size).await?,
            _ => Vec::new(),
        };
        Ok(Page {
            students,
            total_pages: total_pages(total, size),
        })
    }

    pub async fn search_by_name(&self, fragment: &str) -> Result<Vec<Student>, Error> {
        self.store.search(SearchField::Ten, fragment).await
    }

    pub async fn search_by_city(&self, fragment: &str) -> Result<Vec<Student>, Error> {
        self.store.search(SearchField::ThanhPho, fragment).await
    }

    /// Matches when either the city or the name contains the fragment.
    pub async fn search_by_city_or_name(&self, fragment: &str) -> Result<Vec<Student>, Error> {
        self.store.search(SearchField::ThanhPhoOrTen, fragment).await
    }
}
