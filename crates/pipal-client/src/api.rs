//! HTTP client for the course server.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use pipal_core::error::RegistryError;
use pipal_core::model::ProblemMetadata;
use pipal_core::traits::ProblemRegistry;

use crate::credentials::Credentials;
use crate::error::ClientError;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub name: String,
}

/// A batch of course files published together.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Update {
    pub version: u64,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Deserialize)]
struct UpdatesResponse {
    updates: Vec<Update>,
}

/// Authenticated client for the course server.
pub struct PipalClient {
    base_url: String,
    credentials: Credentials,
    problems_root: PathBuf,
    client: reqwest::Client,
}

impl PipalClient {
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            problems_root: PathBuf::from("problems"),
            client,
        })
    }

    /// Local directory under which each fetched problem's files live.
    pub fn with_problems_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.problems_root = root.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        let request = self
            .client
            .get(self.url(path))
            .basic_auth(&self.credentials.username, Some(&self.credentials.password));
        send(request, path).await
    }

    /// `GET /whoami`.
    #[instrument(skip(self))]
    pub async fn whoami(&self) -> Result<User> {
        let response = self.get("/whoami").await?;
        let user = response.json().await.map_err(parse_error)?;
        Ok(user)
    }

    /// Submit the assignment in `path`, named after the file stem.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn submit(&self, path: &Path) -> Result<String> {
        let assignment = path
            .file_stem()
            .with_context(|| format!("not a file: {}", path.display()))?
            .to_string_lossy()
            .into_owned();
        let payload = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let route = format!("/assignments/{assignment}");
        let request = self
            .client
            .post(self.url(&route))
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .body(payload);
        send(request, &route).await?;
        tracing::info!(%assignment, "assignment submitted");
        Ok(assignment)
    }

    /// Pending updates, oldest first.
    pub async fn updates(&self) -> Result<Vec<Update>> {
        let response = self.get("/updates").await?;
        let body: UpdatesResponse = response.json().await.map_err(parse_error)?;
        Ok(body.updates)
    }

    /// Text of a course file.
    pub async fn fetch_file(&self, path: &str) -> Result<String> {
        let response = self.get(&format!("/files/{path}")).await?;
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;
        Ok(text)
    }

    /// Metadata of a server-hosted problem.
    pub async fn get_problem(&self, name: &str) -> Result<ProblemMetadata, RegistryError> {
        let response = match self.get(&format!("/problems/{name}")).await {
            Ok(response) => response,
            Err(ClientError::NotFound(_)) => {
                return Err(RegistryError::UnknownProblem(name.to_string()))
            }
            Err(e) => return Err(RegistryError::Other(e.into())),
        };
        let mut metadata: ProblemMetadata =
            response.json().await.map_err(|e| RegistryError::Malformed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        metadata.name = name.to_string();
        metadata.root = Some(self.problems_root.join(name));
        Ok(metadata)
    }
}

/// Send a request and map error statuses.
async fn send(request: reqwest::RequestBuilder, path: &str) -> Result<reqwest::Response, ClientError> {
    let response = request
        .send()
        .await
        .map_err(|e| ClientError::NetworkError(e.to_string()))?;

    let status = response.status().as_u16();
    tracing::debug!(path, status, "server responded");
    match status {
        401 | 403 => Err(ClientError::InvalidCredentials),
        404 => Err(ClientError::NotFound(path.to_string())),
        s if s >= 400 => {
            let message = response.text().await.unwrap_or_default();
            Err(ClientError::ApiError { status, message })
        }
        _ => Ok(response),
    }
}

fn parse_error(e: reqwest::Error) -> ClientError {
    ClientError::ApiError {
        status: 0,
        message: format!("failed to parse response: {e}"),
    }
}

#[async_trait]
impl ProblemRegistry for PipalClient {
    async fn fetch(&self, name: &str) -> Result<ProblemMetadata, RegistryError> {
        self.get_problem(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // base64("ada:secret")
    const AUTH: &str = "Basic YWRhOnNlY3JldA==";

    fn client(server: &MockServer) -> PipalClient {
        PipalClient::new(&server.uri(), Credentials::new("ada", "secret")).unwrap()
    }

    #[tokio::test]
    async fn whoami_sends_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/whoami"))
            .and(header("authorization", AUTH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "Ada"})),
            )
            .mount(&server)
            .await;

        let user = client(&server).whoami().await.unwrap();
        assert_eq!(user.name, "Ada");
    }

    #[tokio::test]
    async fn whoami_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/whoami"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client(&server).whoami().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn submit_posts_file_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/assignments/week1"))
            .and(body_string("print('hi')\n"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("week1.py");
        std::fs::write(&file, "print('hi')\n").unwrap();

        let assignment = client(&server).submit(&file).await.unwrap();
        assert_eq!(assignment, "week1");
    }

    #[tokio::test]
    async fn submit_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("week1.py");
        std::fs::write(&file, "x").unwrap();

        let err = client(&server).submit(&file).await.unwrap_err();
        assert_eq!(err.to_string(), "API error (HTTP 500): boom");
    }

    #[tokio::test]
    async fn updates_and_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/updates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "updates": [{"version": 2, "files": ["notes/intro.md"]}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/notes/intro.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Intro\n"))
            .mount(&server)
            .await;

        let client = client(&server);
        let updates = client.updates().await.unwrap();
        assert_eq!(
            updates,
            vec![Update {
                version: 2,
                files: vec!["notes/intro.md".into()]
            }]
        );
        assert_eq!(client.fetch_file("notes/intro.md").await.unwrap(), "# Intro\n");
    }

    #[tokio::test]
    async fn problem_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/problems/square"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "function_name": "square",
                "checks": [{"code": "square(2)", "expected": 4}]
            })))
            .mount(&server)
            .await;

        let client = client(&server).with_problems_root("course/problems");
        let problem = client.fetch("square").await.unwrap();
        assert_eq!(problem.name, "square");
        assert_eq!(problem.function_name.as_deref(), Some("square"));
        assert_eq!(problem.root, Some(PathBuf::from("course/problems/square")));
    }

    #[tokio::test]
    async fn unknown_problem() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/problems/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server).fetch("ghost").await.unwrap_err();
        assert!(matches!(err, RegistryError::UnknownProblem(n) if n == "ghost"));
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let client = PipalClient::new("http://127.0.0.1:1", Credentials::new("a", "b")).unwrap();
        let err = client.whoami().await.unwrap_err();
        assert!(err.to_string().starts_with("network error"));
    }
}
