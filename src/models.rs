use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_TEN_LEN: usize = 100;
pub const MAX_THANH_PHO_LEN: usize = 100;
pub const MAX_XEP_LOAI_LEN: usize = 50;

/// A stored student row. `id` and `created_at` are owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub ten: String,
    pub thanh_pho: Option<String>,
    pub ngay_sinh: NaiveDate,
    pub xep_loai: String,
    pub created_at: DateTime<Utc>,
}

/// The replaceable part of a student, produced by validating a [`StudentDto`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentFields {
    pub ten: String,
    pub thanh_pho: Option<String>,
    pub ngay_sinh: NaiveDate,
    pub xep_loai: String,
}

/// Request body for create and update.
///
/// Every field is optional on the wire so that missing or malformed values
/// surface as field messages from [`StudentDto::validate`] rather than as a
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDto {
    pub ten: Option<String>,
    pub thanh_pho: Option<String>,
    pub ngay_sinh: Option<String>,
    pub xep_loai: Option<String>,
}

impl StudentDto {
    pub fn validate(self, today: NaiveDate) -> Result<StudentFields, Vec<String>> {
        let mut errors = Vec::new();

        let ten = self.ten.map(|s| s.trim().to_string()).unwrap_or_default();
        if ten.is_empty() {
            errors.push("ten is required".to_string());
        } else if ten.chars().count() > MAX_TEN_LEN {
            errors.push(format!("ten must be at most {} characters", MAX_TEN_LEN));
        }

        let thanh_pho = self
            .thanh_pho
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(city) = &thanh_pho {
            if city.chars().count() > MAX_THANH_PHO_LEN {
                errors.push(format!(
                    "thanhPho must be at most {} characters",
                    MAX_THANH_PHO_LEN
                ));
            }
        }

        let ngay_sinh = match self.ngay_sinh.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push("ngaySinh is required".to_string());
                None
            }
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) if date > today => {
                    errors.push("ngaySinh must be in the past".to_string());
                    None
                }
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push("ngaySinh must be a date formatted as YYYY-MM-DD".to_string());
                    None
                }
            },
        };

        let xep_loai = self.xep_loai.map(|s| s.trim().to_string()).unwrap_or_default();
        if xep_loai.is_empty() {
            errors.push("xepLoai is required".to_string());
        } else if xep_loai.chars().count() > MAX_XEP_LOAI_LEN {
            errors.push(format!(
                "xepLoai must be at most {} characters",
                MAX_XEP_LOAI_LEN
            ));
        }

        match ngay_sinh {
            Some(ngay_sinh) if errors.is_empty() => Ok(StudentFields {
                ten,
                thanh_pho,
                ngay_sinh,
                xep_loai,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponse {
    pub id: i64,
    pub ten: String,
    pub thanh_pho: Option<String>,
    pub ngay_sinh: NaiveDate,
    pub xep_loai: String,
    pub created_at: DateTime<Utc>,
}

impl From<Student> for StudentResponse {
    fn from(student: Student) -> Self {
        Self {
            id: student.id,
            ten: student.ten,
            thanh_pho: student.thanh_pho,
            ngay_sinh: student.ngay_sinh,
            xep_loai: student.xep_loai,
            created_at: student.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentListResponse {
    pub students_response_list: Vec<StudentResponse>,
    pub total_pages: i64,
}
