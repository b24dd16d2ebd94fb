use reqwest::{RequestBuilder, Response, StatusCode};
use thiserror::Error as ThisError;
use tracing::debug;

use crate::student::Student;

pub const BASE_URL: &str = "http://localhost:8080";

/// Read requests are sent as this identity.
const READER: Credentials = Credentials {
    username: "user",
    password: "userpwd",
};

/// Writes and deletes are sent as this identity.
const ADMIN: Credentials = Credentials {
    username: "admin",
    password: "adminpwd",
};

struct Credentials {
    username: &'static str,
    password: &'static str,
}

#[derive(Debug, ThisError)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("cannot update a student without an id")]
    MissingId,
    #[error("unexpected response status {0}")]
    UnexpectedStatus(StatusCode),
}

/// HTTP client for the `/students` API.
///
/// Reads authenticate as a plain user, writes as an administrator. The server does not check
/// either.
#[derive(Clone, Debug)]
pub struct StudentClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for StudentClient {
    fn default() -> Self {
        Self::new(BASE_URL)
    }
}

impl StudentClient {
    pub fn new(base_url: impl Into<String>) -> StudentClient {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        StudentClient {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `None` when the server has no student with this id.
    pub async fn get(&self, id: i64) -> Result<Option<Student>, ClientError> {
        let request = self.http.get(self.url(&format!("/students/{id}")));
        let response = send(request, &READER).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            _ => Ok(Some(ok(response)?.json().await?)),
        }
    }

    pub async fn get_all(&self) -> Result<Vec<Student>, ClientError> {
        let request = self.http.get(self.url("/students"));
        let response = send(request, &READER).await?;
        Ok(ok(response)?.json().await?)
    }

    /// Students whose name contains `name`, ignoring case.
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Student>, ClientError> {
        let request = self
            .http
            .get(self.url("/students"))
            .query(&[("name", name)]);
        let response = send(request, &READER).await?;
        Ok(ok(response)?.json().await?)
    }

    pub async fn create(&self, student: &Student) -> Result<Student, ClientError> {
        let request = self.http.post(self.url("/students")).json(student);
        let response = send(request, &ADMIN).await?;
        Ok(ok(response)?.json().await?)
    }

    /// Replaces the student with `student.id`. `None` when the server has no such student.
    pub async fn update(&self, student: &Student) -> Result<Option<Student>, ClientError> {
        let id = student.id.ok_or(ClientError::MissingId)?;
        let request = self
            .http
            .put(self.url(&format!("/students/{id}")))
            .json(student);
        let response = send(request, &ADMIN).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            _ => Ok(Some(ok(response)?.json().await?)),
        }
    }

    /// Returns `false` when there was nothing to delete.
    pub async fn delete(&self, id: i64) -> Result<bool, ClientError> {
        let request = self.http.delete(self.url(&format!("/students/{id}")));
        let response = send(request, &ADMIN).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            _ => ok(response).map(|_| true),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn send(request: RequestBuilder, credentials: &Credentials) -> Result<Response, ClientError> {
    let response = request
        .basic_auth(credentials.username, Some(credentials.password))
        .send()
        .await?;

    debug!(
        "{} {} -> {}",
        credentials.username,
        response.url(),
        response.status()
    );
    Ok(response)
}

fn ok(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::UnexpectedStatus(status))
    }
}
