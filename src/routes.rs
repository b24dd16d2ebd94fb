use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use thiserror::Error as ThisError;
use tower_http::trace::TraceLayer;
use tracing::{error, info_span};
use uuid::Uuid;

use crate::service::StudentService;
use crate::store::{SharedStore, StoreError};
use crate::student::Student;

/// Builds the `/students` API on top of `store`.
///
/// | Route                    | Found           | Missing |
/// |--------------------------|-----------------|---------|
/// | `GET /students/{id}`     | 200 + student   | 404     |
/// | `GET /students?name=`    | 200 + students  | -       |
/// | `POST /students`         | 200 + created   | -       |
/// | `PUT /students/{id}`     | 200 + updated   | 404     |
/// | `DELETE /students/{id}`  | 200             | 404     |
pub fn router(store: SharedStore) -> Router {
    let service = StudentService::new(store);

    Router::new()
        .route("/students", get(list_students).post(add_new_student))
        .route(
            "/students/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .with_state(service)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            info_span!(
                "request",
                request_id = %Uuid::new_v4(),
                method = %request.method(),
                uri = %request.uri(),
            )
        }))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    name: Option<String>,
}

async fn get_student(
    State(service): State<StudentService>,
    Path(id): Path<i64>,
) -> Result<Json<Student>, ApiError> {
    let student = service.find_student_by_id(id).await?;
    student.map(Json).ok_or(ApiError::NotFound)
}

async fn list_students(
    State(service): State<StudentService>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Student>>, ApiError> {
    let students = service.find_students_by_name(params.name.as_deref()).await?;
    Ok(Json(students))
}

async fn add_new_student(
    State(service): State<StudentService>,
    Json(student): Json<Student>,
) -> Result<Json<Student>, ApiError> {
    let student = service.add_new_student(student).await?;
    Ok(Json(student))
}

async fn update_student(
    State(service): State<StudentService>,
    Path(id): Path<i64>,
    Json(student): Json<Student>,
) -> Result<Json<Student>, ApiError> {
    let student = service.update_student(id, student).await?;
    student.map(Json).ok_or(ApiError::NotFound)
}

// Access control is not enforced; any caller may delete.
async fn delete_student(
    State(service): State<StudentService>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let student = service
        .find_student_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;

    service.delete_student(&student).await?;
    Ok(StatusCode::OK)
}

#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("student not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::Store(err) => {
                error!("Store failure: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::body::to_bytes;
    use axum::http::header::CONTENT_TYPE;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let store = MemoryStore::with_students([
            Student::with_id(1, "name-1"),
            Student::with_id(2, "name-2"),
        ])
        .unwrap();
        router(Arc::new(store))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn get_existing() {
        let response = app()
            .oneshot(empty_request("GET", "/students/1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let student: Student = body_json(response).await;
        assert_eq!(student, Student::with_id(1, "name-1"));
    }

    #[tokio::test]
    async fn get_missing() {
        let response = app()
            .oneshot(empty_request("GET", "/students/3"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_with_non_numeric_id() {
        let response = app()
            .oneshot(empty_request("GET", "/students/abc"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_all() {
        let response = app()
            .oneshot(empty_request("GET", "/students"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let students: Vec<Student> = body_json(response).await;
        assert_eq!(
            students,
            vec![Student::with_id(1, "name-1"), Student::with_id(2, "name-2")]
        );
    }

    #[tokio::test]
    async fn list_by_name_ignores_case() {
        let response = app()
            .oneshot(empty_request("GET", "/students?name=NAME-1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let students: Vec<Student> = body_json(response).await;
        assert_eq!(students, vec![Student::with_id(1, "name-1")]);
    }

    #[tokio::test]
    async fn list_without_matches_is_empty() {
        let response = app()
            .oneshot(empty_request("GET", "/students?name=nobody"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let students: Vec<Student> = body_json(response).await;
        assert!(students.is_empty());
    }

    #[tokio::test]
    async fn create_assigns_id() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/students",
                serde_json::json!({"name": "some name"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let student: Student = body_json(response).await;
        assert!(student.id.is_some());
        assert_eq!(student.name, "some name");
    }

    #[tokio::test]
    async fn create_with_malformed_body() {
        let response = app()
            .oneshot(json_request("POST", "/students", serde_json::json!({"id": "one"})))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn update_keeps_path_id() {
        let app = app();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/students/2",
                serde_json::json!({"id": 7, "name": "renamed"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let student: Student = body_json(response).await;
        assert_eq!(student, Student::with_id(2, "renamed"));

        let response = app
            .oneshot(empty_request("GET", "/students/7"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_missing() {
        let response = app()
            .oneshot(json_request(
                "PUT",
                "/students/3",
                serde_json::json!({"id": 3, "name": "ghost"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_then_get() {
        let app = app();

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", "/students/1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/students/1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(empty_request("DELETE", "/students/1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_after_max_id_is_a_server_error() {
        let app = app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/students",
                serde_json::json!({"id": i64::MAX, "name": "max"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/students",
                serde_json::json!({"name": "next"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"internal server error");

        // The failed insert left the store usable.
        let response = app
            .oneshot(empty_request("GET", "/students"))
            .await
            .unwrap();
        let students: Vec<Student> = body_json(response).await;
        assert_eq!(students.len(), 3);
    }
}
