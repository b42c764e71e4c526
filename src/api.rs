// API client module: a small blocking HTTP client that talks to the Chirp
// backend. One method per remote operation; each performs a single request
// and reports what the server said.

use anyhow::{Context, Result};
use log::debug;
use reqwest::blocking::{multipart, Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Base URL of the Chirp API. Fixed for this version; not overridable by
/// flag or environment variable.
pub const BASE_URL: &str = "http://localhost:3000";

/// What the server said: `Ok` with the parsed body on the expected status,
/// `Err` with the body's `error` field otherwise. Transport faults are a
/// separate concern and surface as `anyhow::Error`.
pub type ServerReply<T> = Result<T, String>;

/// Blocking API client holding the reqwest client and the base URL.
/// Bearer tokens are passed per call; the client itself is stateless.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Remote user as returned by the users listing. The id's JSON type is not
/// contractually fixed, so it stays a `serde_json::Value`.
#[derive(Deserialize, Debug)]
pub struct User {
    pub id: Value,
    pub name: String,
}

/// Remote notification entry, read-only from the client's perspective.
#[derive(Deserialize, Debug)]
pub struct Notification {
    pub id: Value,
    #[serde(rename = "type")]
    pub kind: Value,
    pub post_id: Value,
    pub liked_by: Value,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct UsersResponse {
    users: Vec<User>,
}

#[derive(Deserialize)]
struct NotificationsResponse {
    notifications: Vec<Notification>,
}

impl ApiClient {
    /// Create an ApiClient pointed at the fixed [`BASE_URL`].
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    /// Create an ApiClient against an arbitrary base URL (tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.into(),
        })
    }

    /// Register a user by POSTing name and password as multipart form
    /// fields, matching the backend's registration endpoint.
    pub fn register(&self, name: &str, password: &str) -> Result<ServerReply<()>> {
        let url = format!("{}/auth/register", self.base_url);
        debug!("POST {url}");
        let form = multipart::Form::new()
            .text("name", name.to_string())
            .text("password", password.to_string());
        let res = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .context("Failed to send register request")?;
        if res.status() != StatusCode::CREATED {
            return Ok(Err(remote_error(res)));
        }
        Ok(Ok(()))
    }

    /// Log in with a JSON body and return the issued bearer token.
    pub fn login(&self, name: &str, password: &str) -> Result<ServerReply<String>> {
        let url = format!("{}/auth/login", self.base_url);
        debug!("POST {url}");
        let payload = serde_json::json!({ "name": name, "password": password });
        let res = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .context("Failed to send login request")?;
        if res.status() != StatusCode::OK {
            return Ok(Err(remote_error(res)));
        }
        let resp: LoginResponse = res.json().context("Parsing login response json")?;
        Ok(Ok(resp.token))
    }

    /// List all users.
    pub fn get_users(&self, token: &str) -> Result<ServerReply<Vec<User>>> {
        let url = format!("{}/api/v1/users", self.base_url);
        debug!("GET {url}");
        let res = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .context("Failed to send users request")?;
        if res.status() != StatusCode::OK {
            return Ok(Err(remote_error(res)));
        }
        let resp: UsersResponse = res.json().context("Parsing users response json")?;
        Ok(Ok(resp.users))
    }

    /// Create a post with the given content.
    pub fn create_post(&self, token: &str, content: &str) -> Result<ServerReply<()>> {
        let url = format!("{}/api/v1/posts", self.base_url);
        debug!("POST {url}");
        let payload = serde_json::json!({ "content": content });
        let res = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .context("Failed to send create post request")?;
        if res.status() != StatusCode::CREATED {
            return Ok(Err(remote_error(res)));
        }
        Ok(Ok(()))
    }

    /// Like the post with the given id. The request has no body; the id is
    /// part of the path.
    pub fn like_post(&self, token: &str, id: &str) -> Result<ServerReply<()>> {
        let url = format!("{}/api/v1/posts/{}/like", self.base_url, id);
        debug!("POST {url}");
        let res = self
            .client
            .post(&url)
            .bearer_auth(token)
            .send()
            .context("Failed to send like request")?;
        if res.status() != StatusCode::OK {
            return Ok(Err(remote_error(res)));
        }
        Ok(Ok(()))
    }

    /// Fetch the current user's notifications.
    pub fn read_notifications(&self, token: &str) -> Result<ServerReply<Vec<Notification>>> {
        let url = format!("{}/api/v1/notifications", self.base_url);
        debug!("GET {url}");
        let res = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .context("Failed to send notifications request")?;
        if res.status() != StatusCode::OK {
            return Ok(Err(remote_error(res)));
        }
        let resp: NotificationsResponse = res
            .json()
            .context("Parsing notifications response json")?;
        Ok(Ok(resp.notifications))
    }

    /// Update a user's profile. Name and avatar are both optional; whatever
    /// is present goes into a multipart form. The avatar's content type is
    /// detected from its leading bytes before the file is streamed.
    pub fn update_user(
        &self,
        token: &str,
        user_id: &str,
        name: Option<&str>,
        avatar: Option<&Path>,
    ) -> Result<ServerReply<()>> {
        let url = format!("{}/api/v1/users/{}", self.base_url, user_id);
        debug!("PATCH {url}");

        let mut form = multipart::Form::new();
        if let Some(name) = name {
            form = form.text("name", name.to_string());
        }
        if let Some(path) = avatar {
            form = form.part("avatar", avatar_part(path)?);
        }

        let res = self
            .client
            .patch(&url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .context("Failed to send update user request")?;
        if res.status() != StatusCode::OK {
            return Ok(Err(remote_error(res)));
        }
        Ok(Ok(()))
    }
}

/// Build the avatar multipart part: sniff the MIME type from the first 2048
/// bytes, rewind, and stream the file with the detected content type.
fn avatar_part(path: &Path) -> Result<multipart::Part> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open avatar file {}", path.display()))?;
    let mut head = [0u8; 2048];
    let read = file.read(&mut head).context("Failed to read avatar file")?;
    let kind = infer::get(&head[..read])
        .with_context(|| format!("Could not detect MIME type of {}", path.display()))?;
    file.seek(SeekFrom::Start(0))
        .context("Failed to rewind avatar file")?;

    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("avatar")
        .to_string();
    multipart::Part::reader(file)
        .file_name(file_name)
        .mime_str(kind.mime_type())
        .context("Invalid avatar content type")
}

/// Extract the `error` field from a rejection body. A missing field or an
/// unparsable body degrades to a `null` display instead of failing hard.
fn remote_error(res: Response) -> String {
    let body: Value = res.json().unwrap_or(Value::Null);
    plain(body.get("error").unwrap_or(&Value::Null))
}

/// Render a JSON value for humans: strings verbatim, everything else in its
/// JSON form (`null`, numbers, arrays).
pub(crate) fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::with_base_url(server.url()).unwrap()
    }

    #[test]
    fn register_succeeds_on_created() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/auth/register")
            .with_status(201)
            .create();
        assert_eq!(client(&server).register("alice", "pw").unwrap(), Ok(()));
        mock.assert();
    }

    #[test]
    fn register_surfaces_server_error() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/auth/register")
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"name already taken"}"#)
            .create();
        assert_eq!(
            client(&server).register("alice", "pw").unwrap(),
            Err("name already taken".to_string())
        );
    }

    #[test]
    fn rejection_without_error_field_degrades_to_null() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/auth/register")
            .with_status(500)
            .with_body("boom")
            .create();
        assert_eq!(
            client(&server).register("alice", "pw").unwrap(),
            Err("null".to_string())
        );
    }

    #[test]
    fn login_returns_issued_token() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"abc123"}"#)
            .create();
        assert_eq!(
            client(&server).login("alice", "pw").unwrap(),
            Ok("abc123".to_string())
        );
    }

    #[test]
    fn like_post_targets_the_post_path() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/v1/posts/42/like")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .create();
        assert_eq!(client(&server).like_post("tok", "42").unwrap(), Ok(()));
        mock.assert();
    }

    #[test]
    fn like_post_fails_on_other_statuses() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/v1/posts/42/like")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"post not found"}"#)
            .create();
        assert_eq!(
            client(&server).like_post("tok", "42").unwrap(),
            Err("post not found".to_string())
        );
    }

    #[test]
    fn get_users_parses_listing() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/v1/users")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"users":[{"id":1,"name":"alice"},{"id":2,"name":"bob"}]}"#)
            .create();
        let users = client(&server).get_users("tok").unwrap().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].name, "bob");
    }

    #[test]
    fn update_user_streams_avatar_with_detected_type() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PATCH", "/api/v1/users/7")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .create();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar.png");
        // Minimal PNG signature, enough for content-type sniffing.
        std::fs::write(&path, [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]).unwrap();
        assert_eq!(
            client(&server)
                .update_user("tok", "7", Some("Ada"), Some(&path))
                .unwrap(),
            Ok(())
        );
        mock.assert();
    }

    #[test]
    fn update_user_aborts_when_avatar_type_is_unknown() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PATCH", mockito::Matcher::Any)
            .expect(0)
            .create();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar.bin");
        std::fs::write(&path, b"just some plain text").unwrap();
        let err = client(&server)
            .update_user("tok", "7", None, Some(&path))
            .unwrap_err();
        assert!(err.to_string().contains("Could not detect MIME type"));
        mock.assert();
    }
}
