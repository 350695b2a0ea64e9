use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::models::{Student, StudentDto, StudentListResponse, StudentResponse};
use crate::query::{PageRequest, QueryEngine};
use crate::{proceeds, respond, Payload};

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub name: String,
}

fn responses(students: Vec<Student>) -> Vec<StudentResponse> {
    students.into_iter().map(StudentResponse::from).collect()
}

pub async fn create_student(
    Extension(engine): Extension<QueryEngine>,
    body: Result<Json<StudentDto>, JsonRejection>,
) -> Payload<StudentResponse> {
    let Json(dto) = body?;
    let student = engine.create(dto).await?;
    log::info!("Created student {}", student.id);
    respond(
        StatusCode::CREATED,
        "Insert successfully",
        StudentResponse::from(student),
    )
}

pub async fn list_students(
    Extension(engine): Extension<QueryEngine>,
    params: Result<Query<PageRequest>, QueryRejection>,
) -> Payload<StudentListResponse> {
    let Query(request) = params?;
    log::debug!("Listing students with {:?}", request);
    let page = engine.list_page(request).await?;
    proceeds(
        "List successfully",
        StudentListResponse {
            students_response_list: responses(page.students),
            total_pages: page.total_pages,
        },
    )
}

pub async fn all_students(
    Extension(engine): Extension<QueryEngine>,
) -> Payload<Vec<StudentResponse>> {
    proceeds("OK", responses(engine.list_all().await?))
}

pub async fn get_student(
    Extension(engine): Extension<QueryEngine>,
    id: Result<Path<i64>, PathRejection>,
) -> Payload<StudentResponse> {
    let Path(id) = id?;
    proceeds("OK", StudentResponse::from(engine.get(id).await?))
}

pub async fn update_student(
    Extension(engine): Extension<QueryEngine>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<StudentDto>, JsonRejection>,
) -> Payload<StudentResponse> {
    let Path(id) = id?;
    let Json(dto) = body?;
    let student = engine.update(id, dto).await?;
    log::info!("Updated student {}", id);
    proceeds("Update successfully", StudentResponse::from(student))
}

pub async fn delete_student(
    Extension(engine): Extension<QueryEngine>,
    id: Result<Path<i64>, PathRejection>,
) -> Payload<()> {
    let Path(id) = id?;
    engine.delete(id).await?;
    log::info!("Deleted student {}", id);
    proceeds("Delete successfully", ())
}

pub async fn search_by_name(
    Extension(engine): Extension<QueryEngine>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Payload<Vec<StudentResponse>> {
    let Query(SearchParams { name }) = params?;
    log::debug!("Searching names for {:?}", name);
    proceeds(
        "Search successfully",
        responses(engine.search_by_name(&name).await?),
    )
}

pub async fn search_by_city(
    Extension(engine): Extension<QueryEngine>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Payload<Vec<StudentResponse>> {
    let Query(SearchParams { name }) = params?;
    log::debug!("Searching cities for {:?}", name);
    proceeds(
        "Search successfully",
        responses(engine.search_by_city(&name).await?),
    )
}

pub async fn search_by_city_or_name(
    Extension(engine): Extension<QueryEngine>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Payload<Vec<StudentResponse>> {
    let Query(SearchParams { name }) = params?;
    log::debug!("Searching cities and names for {:?}", name);
    proceeds(
        "Search successfully",
        responses(engine.search_by_city_or_name(&name).await?),
    )
}
