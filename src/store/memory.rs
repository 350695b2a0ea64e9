use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{SearchField, StudentStore};
use crate::err::Error;
use crate::models::{Student, StudentFields};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, Student>,
    next_id: i64,
    last_created: Option<DateTime<Utc>>,
}

impl Table {
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_created = Some(stamp);
        stamp
    }
}

/// In-process store with the same ordering and matching rules as [`super::PgStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn matches(student: &Student, field: SearchField, needle: &str) -> bool {
    let city = student.thanh_pho.as_deref().unwrap_or("");
    match field {
        SearchField::Ten => contains_ignore_case(&student.ten, needle),
        SearchField::ThanhPho => contains_ignore_case(city, needle),
        SearchField::ThanhPhoOrTen => {
            contains_ignore_case(city, needle) || contains_ignore_case(&student.ten, needle)
        }
    }
}

#[async_trait]
impl StudentStore for MemoryStore {
    async fn insert(&self, fields: StudentFields) -> Result<Student, Error> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let student = Student {
            id: table.next_id,
            ten: fields.ten,
            thanh_pho: fields.thanh_pho,
            ngay_sinh: fields.ngay_sinh,
            xep_loai: fields.xep_loai,
            created_at: table.stamp(),
        };
        table.rows.insert(student.id, student.clone());
        Ok(student)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Student>, Error> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool, Error> {
        Ok(self.table.read().await.rows.contains_key(&id))
    }

    async fn update(&self, id: i64, fields: StudentFields) -> Result<Option<Student>, Error> {
        let mut table = self.table.write().await;
        Ok(table.rows.get_mut(&id).map(|student| {
            student.ten = fields.ten;
            student.thanh_pho = fields.thanh_pho;
            student.ngay_sinh = fields.ngay_sinh;
            student.xep_loai = fields.xep_loai;
            student.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, Error> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }

    async fn list_all(&self) -> Result<Vec<Student>, Error> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn count(&self) -> Result<i64, Error> {
        Ok(self.table.read().await.rows.len() as i64)
    }

    async fn list_window(&self, offset: i64, limit: i64) -> Result<Vec<Student>, Error> {
        let table = self.table.read().await;
        let mut rows: Vec<&Student> = table.rows.values().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn search(&self, field: SearchField, fragment: &str) -> Result<Vec<Student>, Error> {
        let needle = fragment.to_lowercase();
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|student| matches(student, field, &needle))
            .cloned()
            .collect())
    }
}
