pub mod config;
pub mod err;
pub mod models;
pub mod query;
pub mod store;
pub mod students;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, put};
use axum::{Extension, Json, Router};

use std::sync::Arc;
use clap::Parser;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::err::{Envelope, Error};
use crate::query::QueryEngine;
use crate::store::{MemoryStore, PgStore, StudentStore};

pub type Payload<T> = axum::response::Result<(StatusCode, Json<Envelope<T>>), Error>;

/// Answers HTTP 200; `status` is only reported inside the envelope.
pub fn respond<V, S: Into<String>>(status: StatusCode, message: S, data: V) -> Payload<V>
where
    V: Serialize,
{
    Ok((StatusCode::OK, Json(Envelope::of(status, message, data))))
}

pub fn proceeds<V, S: Into<String>>(message: S, data: V) -> Payload<V>
where
    V: Serialize,
{
    respond(StatusCode::OK, message, data)
}

pub fn app(engine: QueryEngine, allowed_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route(
            "/api/v1/student",
            get(students::all_students).post(students::create_student),
        )
        .route("/api/v1/student/list", get(students::list_students))
        .route("/api/v1/student/search1", get(students::search_by_name))
        .route("/api/v1/student/search2", get(students::search_by_city))
        .route("/api/v1/student/search3", get(students::search_by_city_or_name))
        .route(
            "/api/v1/student/:id",
            put(students::update_student)
                .delete(students::delete_student)
                .get(students::get_student),
        )
        .fallback(err::handler404)
        .layer(Extension(engine))
        .layer(cors)
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn StudentStore>> {
    Ok(match &config.database_url {
        Some(url) => {
            log::info!("Using PostgreSQL student store");
            Arc::new(PgStore::connect(url, config.max_connections).await?)
        }
        None => {
            log::warn!("No database configured, student records will be kept in memory");
            Arc::new(MemoryStore::new())
        }
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", err);
    }
    log::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::parse();
    let origin = HeaderValue::from_str(&config.allowed_origin)?;
    let engine = QueryEngine::new(open_store(&config).await?);

    log::info!("Allowing cross-origin requests from {}", config.allowed_origin);
    log::info!("Starting student registry HTTP server on http://{}", config.bind);
    axum::Server::bind(&config.bind)
        .serve(app(engine, origin).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const ORIGIN: &str = "http://localhost:3000";

    fn test_app() -> Router {
        let engine = QueryEngine::new(Arc::new(MemoryStore::new()));
        app(engine, HeaderValue::from_static(ORIGIN))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn student(ten: &str, city: &str) -> Value {
        json!({ "ten": ten, "thanhPho": city, "ngaySinh": "2002-04-30", "xepLoai": "Gioi" })
    }

    #[tokio::test]
    async fn create_wraps_record_in_envelope() {
        let app = test_app();
        let (status, body) = call(&app, "POST", "/api/v1/student", Some(student("An", "Hanoi"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], 201);
        assert_eq!(body["message"], "Insert successfully");
        assert_eq!(body["data"]["id"], 1);
        assert_eq!(body["data"]["ten"], "An");
        assert_eq!(body["data"]["thanhPho"], "Hanoi");
        assert_eq!(body["data"]["ngaySinh"], "2002-04-30");
    }

    #[tokio::test]
    async fn create_reports_field_errors() {
        let app = test_app();
        let (status, body) = call(&app, "POST", "/api/v1/student", Some(json!({ "thanhPho": "Hue" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(body["message"], "Validation Failed");
        assert_eq!(
            body["data"],
            json!(["ten is required", "ngaySinh is required", "xepLoai is required"])
        );
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let app = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/student")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn paged_listing_reports_total_pages() {
        let app = test_app();
        for i in 0..7 {
            call(&app, "POST", "/api/v1/student", Some(student(&format!("s{}", i), "Hue"))).await;
        }
        let (status, body) = call(&app, "GET", "/api/v1/student/list?page=0&size=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "List successfully");
        assert_eq!(body["data"]["totalPages"], 2);
        assert_eq!(body["data"]["studentsResponseList"].as_array().unwrap().len(), 5);

        let (_, body) = call(&app, "GET", "/api/v1/student/list?page=1&size=5", None).await;
        assert_eq!(body["data"]["studentsResponseList"].as_array().unwrap().len(), 2);

        let (_, body) = call(&app, "GET", "/api/v1/student/list", None).await;
        assert_eq!(body["data"]["studentsResponseList"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn bad_paging_is_rejected() {
        let app = test_app();
        let (status, body) = call(&app, "GET", "/api/v1/student/list?page=-1&size=5", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["data"], json!(["page must not be negative"]));

        let (status, _) = call(&app, "GET", "/api/v1/student/list?size=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn full_listing_returns_everything() {
        let app = test_app();
        call(&app, "POST", "/api/v1/student", Some(student("An", "Hanoi"))).await;
        call(&app, "POST", "/api/v1/student", Some(student("Binh", "Hue"))).await;
        let (status, body) = call(&app, "GET", "/api/v1/student", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "OK");
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_and_delete_signal_missing_ids() {
        let app = test_app();
        let (status, body) = call(&app, "PUT", "/api/v1/student/9", Some(student("X", "Y"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Student with id 9 not found");

        let (status, body) = call(&app, "DELETE", "/api/v1/student/9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);

        let (status, _) = call(&app, "DELETE", "/api/v1/student/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_then_delete_round_trip() {
        let app = test_app();
        call(&app, "POST", "/api/v1/student", Some(student("An", "Hanoi"))).await;

        let (status, body) = call(&app, "PUT", "/api/v1/student/1", Some(student("An Le", "Hue"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Update successfully");
        assert_eq!(body["data"]["ten"], "An Le");

        let (status, body) = call(&app, "DELETE", "/api/v1/student/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Delete successfully");
        assert_eq!(body["data"], Value::Null);

        let (status, _) = call(&app, "GET", "/api/v1/student/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_endpoints_match_case_insensitively() {
        let app = test_app();
        call(&app, "POST", "/api/v1/student", Some(student("An", "Hanoi"))).await;
        call(&app, "POST", "/api/v1/student", Some(student("Binh", "Hue"))).await;

        let (_, body) = call(&app, "GET", "/api/v1/student/search1?name=BIN", None).await;
        assert_eq!(body["message"], "Search successfully");
        assert_eq!(body["data"][0]["ten"], "Binh");
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (_, body) = call(&app, "GET", "/api/v1/student/search2?name=hanoi", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["ten"], "An");

        let (_, body) = call(&app, "GET", "/api/v1/student/search3?name=an", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (_, body) = call(&app, "GET", "/api/v1/student/search3?name=", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (status, body) = call(&app, "GET", "/api/v1/student/search3?name=xyz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn unknown_paths_get_enveloped_404() {
        let app = test_app();
        let (status, body) = call(&app, "GET", "/api/v2/nothing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invalid path: /api/v2/nothing");
    }

    #[tokio::test]
    async fn configured_origin_is_allowed() {
        let app = test_app();
        let request = Request::builder()
            .method("GET")
            .uri("/api/v1/student")
            .header("origin", ORIGIN)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            ORIGIN
        );
    }
}
