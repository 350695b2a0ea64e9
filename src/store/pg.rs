use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{SearchField, StudentStore};
use crate::err::Error;
use crate::models::{Student, StudentFields};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS students (
    id BIGSERIAL PRIMARY KEY,
    ten TEXT NOT NULL,
    thanh_pho TEXT,
    ngay_sinh DATE NOT NULL,
    xep_loai TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
)";

const COLUMNS: &str = "id, ten, thanh_pho, ngay_sinh, xep_loai, created_at";

/// Lowercases the fragment, escapes LIKE metacharacters and wraps it for
/// substring matching against `lower(column)`.
pub fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn search_predicate(field: SearchField) -> &'static str {
    match field {
        SearchField::Ten => "lower(ten) LIKE $1 ESCAPE '\\'",
        SearchField::ThanhPho => "lower(COALESCE(thanh_pho, '')) LIKE $1 ESCAPE '\\'",
        SearchField::ThanhPhoOrTen => {
            "lower(COALESCE(thanh_pho, '')) LIKE $1 ESCAPE '\\' \
             OR lower(ten) LIKE $1 ESCAPE '\\'"
        }
    }
}

/// `lower()` only folds ASCII under the C/POSIX ctype, which would miss
/// Vietnamese capitals such as `Đ`.
pub fn folds_unicode(lc_ctype: &str) -> bool {
    !matches!(lc_ctype, "C" | "POSIX")
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pg: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pg = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        let store = Self { pg };
        store.ensure_schema().await?;
        store.check_ctype().await?;
        Ok(store)
    }

    async fn check_ctype(&self) -> Result<(), Error> {
        let lc_ctype = sqlx::query_scalar::<_, String>("SELECT current_setting('lc_ctype')")
            .fetch_one(&self.pg)
            .await?;
        if !folds_unicode(&lc_ctype) {
            log::warn!(
                "Database lc_ctype is {}, searches will only ignore ASCII case; use a UTF-8 locale",
                lc_ctype
            );
        }
        Ok(())
    }

    pub async fn ensure_schema(&self) -> Result<(), Error> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pg)
            .await
            .map_err(Error::from)?;
        Ok(())
    }
}

#[async_trait]
impl StudentStore for PgStore {
    async fn insert(&self, fields: StudentFields) -> Result<Student, Error> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "INSERT INTO students (ten, thanh_pho, ngay_sinh, xep_loai) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            COLUMNS
        ))
        .bind(fields.ten)
        .bind(fields.thanh_pho)
        .bind(fields.ngay_sinh)
        .bind(fields.xep_loai)
        .fetch_one(&self.pg)
        .await?;
        Ok(student)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Student>, Error> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students WHERE id = $1 LIMIT 1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pg)
        .await?;
        Ok(student)
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool, Error> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pg)
                .await?;
        Ok(exists)
    }

    async fn update(&self, id: i64, fields: StudentFields) -> Result<Option<Student>, Error> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "UPDATE students SET ten = $1, thanh_pho = $2, ngay_sinh = $3, xep_loai = $4 \
             WHERE id = $5 RETURNING {}",
            COLUMNS
        ))
        .bind(fields.ten)
        .bind(fields.thanh_pho)
        .bind(fields.ngay_sinh)
        .bind(fields.xep_loai)
        .bind(id)
        .fetch_optional(&self.pg)
        .await?;
        Ok(student)
    }

    async fn delete(&self, id: i64) -> Result<bool, Error> {
        let affected = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pg)
            .await?;
        Ok(affected.rows_affected() >= 1)
    }

    async fn list_all(&self) -> Result<Vec<Student>, Error> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students ORDER BY id",
            COLUMNS
        ))
        .fetch_all(&self.pg)
        .await?;
        Ok(students)
    }

    async fn count(&self) -> Result<i64, Error> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pg)
            .await?;
        Ok(total)
    }

    async fn list_window(&self, offset: i64, limit: i64) -> Result<Vec<Student>, Error> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students ORDER BY created_at DESC, id ASC LIMIT $1 OFFSET $2",
            COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pg)
        .await?;
        Ok(students)
    }

    async fn search(&self, field: SearchField, fragment: &str) -> Result<Vec<Student>, Error> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students WHERE {} ORDER BY id",
            COLUMNS,
            search_predicate(field)
        ))
        .bind(like_pattern(fragment))
        .fetch_all(&self.pg)
        .await?;
        Ok(students)
    }
}
