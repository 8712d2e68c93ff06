//! GitHub API Example
//!
//! Demonstrates deriving a client type with defaults and plugins, then
//! calling the REST and GraphQL APIs through the instance hook.

// Example-specific lint allowances
#![allow(missing_docs)]
#![allow(clippy::print_stdout)]
#![allow(dead_code)]

use serde_json::{Value, json};
use tentacle::plugins::request_log;
use tentacle::prelude::*;

/// GitHub REST API version sent with every request.
const API_VERSION: &str = "2022-11-28";

// ============================================================================
// Data Types
// ============================================================================

/// A GitHub contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    pub contributions: u32,
}

/// A GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub stargazers_count: u32,
    pub forks_count: u32,
}

/// Request to create a GitHub issue.
#[derive(Debug, Clone, Serialize)]
pub struct CreateIssue {
    pub title: String,
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// A GitHub issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub number: u32,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
}

// ============================================================================
// Client type
// ============================================================================

/// Pins the REST API version on every request and exposes it as a property.
fn api_version() -> Plugin {
    Plugin::new(|client, _options| {
        client.hook().before("request", |endpoint| {
            endpoint.set_header("x-github-api-version", API_VERSION);
            Ok(())
        });
        Properties::new().with("api_version", API_VERSION)
    })
}

/// The client type every `GitHub` instance is built from.
fn github_type() -> ClientType {
    ClientType::default()
        .defaults(Options::default().user_agent("tentacle-github-example/0.1.0"))
        .plugins([api_version(), request_log()])
}

/// Typed facade over a tentacle [`Client`].
#[derive(Debug, Clone)]
pub struct GitHub {
    client: Client,
}

impl GitHub {
    /// Build a facade from instance options.
    pub fn new(options: Options) -> Result<Self> {
        Ok(Self {
            client: github_type().build(options)?,
        })
    }

    /// List contributors for a repository.
    pub async fn contributors(&self, owner: &str, repo: &str) -> Result<Vec<Contributor>> {
        self.client
            .request_json(
                "GET /repos/{owner}/{repo}/contributors",
                json!({ "owner": owner, "repo": repo }),
            )
            .await
    }

    /// Get repository information.
    pub async fn get_repo(&self, owner: &str, repo: &str) -> Result<Repository> {
        self.client
            .request_json("GET /repos/{owner}/{repo}", json!({ "owner": owner, "repo": repo }))
            .await
    }

    /// Create an issue.
    pub async fn create_issue(&self, owner: &str, repo: &str, issue: &CreateIssue) -> Result<Issue> {
        let mut params = serde_json::to_value(issue)?;
        params["owner"] = json!(owner);
        params["repo"] = json!(repo);
        self.client
            .request_json("POST /repos/{owner}/{repo}/issues", params)
            .await
    }

    /// List issues, optionally filtered by state and paginated.
    pub async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        state: Option<&str>,
        per_page: Option<u32>,
        page: Option<u32>,
    ) -> Result<Vec<Issue>> {
        self.client
            .request_json(
                "GET /repos/{owner}/{repo}/issues",
                json!({
                    "owner": owner,
                    "repo": repo,
                    "state": state,
                    "per_page": per_page,
                    "page": page,
                }),
            )
            .await
    }

    /// Login of the authenticated user, through GraphQL.
    pub async fn viewer_login(&self) -> Result<String> {
        let data: Value = self
            .client
            .graphql()
            .query("query { viewer { login } }", Value::Null)
            .await?;
        Ok(data["viewer"]["login"].as_str().unwrap_or_default().to_string())
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

// ============================================================================
// Main: Demonstrate usage
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let mut options = Options::default();
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        options = options.auth(token);
    }
    let github = GitHub::new(options)?;

    println!("GitHub API client created!");
    println!("Base URL: {}", github.client().defaults().base_url);
    println!(
        "API version: {}",
        github
            .client()
            .property::<&str>("api_version")
            .copied()
            .unwrap_or("unset")
    );
    println!("Request interceptors: {}", github.client().hook().len("request"));

    match github.get_repo("rust-lang", "rust").await {
        Ok(repo) => println!(
            "\n{}: {} stars, {} forks",
            repo.full_name, repo.stargazers_count, repo.forks_count
        ),
        Err(err) => println!("\nCould not fetch rust-lang/rust: {err}"),
    }

    Ok(())
}

// ============================================================================
// Tests using wiremock
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path, query_param},
    };

    fn github(mock_server: &MockServer) -> GitHub {
        GitHub::new(Options::default().base_url(mock_server.uri()).auth("abc123")).expect("client")
    }

    #[tokio::test]
    async fn test_contributors() {
        let mock_server = MockServer::start().await;

        let contributors = vec![
            Contributor {
                login: "user1".to_string(),
                contributions: 100,
            },
            Contributor {
                login: "user2".to_string(),
                contributions: 50,
            },
        ];

        Mock::given(method("GET"))
            .and(path("/repos/rust-lang/rust/contributors"))
            .and(header("x-github-api-version", API_VERSION))
            .and(header("authorization", "token abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&contributors))
            .mount(&mock_server)
            .await;

        let result = github(&mock_server)
            .contributors("rust-lang", "rust")
            .await
            .expect("contributors");

        assert_eq!(result.len(), 2);
        let first = result.first().expect("first contributor");
        assert_eq!(first.login, "user1");
        assert_eq!(first.contributions, 100);
    }

    #[tokio::test]
    async fn test_get_repo() {
        let mock_server = MockServer::start().await;

        let repo = Repository {
            id: 12345,
            name: "rust".to_string(),
            full_name: "rust-lang/rust".to_string(),
            description: Some("The Rust programming language".to_string()),
            stargazers_count: 90000,
            forks_count: 12000,
        };

        Mock::given(method("GET"))
            .and(path("/repos/rust-lang/rust"))
            .and(header("accept", "application/vnd.github.v3+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&repo))
            .mount(&mock_server)
            .await;

        let result = github(&mock_server)
            .get_repo("rust-lang", "rust")
            .await
            .expect("repo");

        assert_eq!(result.name, "rust");
        assert_eq!(result.full_name, "rust-lang/rust");
    }

    #[tokio::test]
    async fn test_create_issue() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/repos/rust-lang/rust/issues"))
            .and(body_json(json!({"title": "Found a bug", "body": null, "labels": ["bug"]})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 1,
                "number": 1347,
                "title": "Found a bug",
                "body": null,
                "state": "open",
            })))
            .mount(&mock_server)
            .await;

        let issue = CreateIssue {
            title: "Found a bug".to_string(),
            body: None,
            assignees: Vec::new(),
            labels: vec!["bug".to_string()],
        };
        let created = github(&mock_server)
            .create_issue("rust-lang", "rust", &issue)
            .await
            .expect("issue");

        assert_eq!(created.number, 1347);
    }

    #[tokio::test]
    async fn test_list_issues_with_query_params() {
        let mock_server = MockServer::start().await;

        let issues = vec![Issue {
            id: 1,
            number: 42,
            title: "Example issue".to_string(),
            body: Some("Issue body".to_string()),
            state: "open".to_string(),
        }];

        Mock::given(method("GET"))
            .and(path("/repos/rust-lang/rust/issues"))
            .and(query_param("state", "open"))
            .and(query_param("per_page", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&issues))
            .mount(&mock_server)
            .await;

        let result = github(&mock_server)
            .list_issues("rust-lang", "rust", Some("open"), Some(5), None)
            .await
            .expect("issues");

        assert!(!result.is_empty());
        assert_eq!(result.first().expect("first issue").number, 42);

        let requests = mock_server.received_requests().await.expect("recording");
        let request = requests.first().expect("one request");
        assert!(
            !request.url.query_pairs().any(|(name, _)| name == "page"),
            "null parameters are not sent"
        );
    }

    #[tokio::test]
    async fn test_viewer_login() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"viewer": {"login": "octocat"}}})),
            )
            .mount(&mock_server)
            .await;

        let login = github(&mock_server)
            .viewer_login()
            .await
            .expect("login");
        assert_eq!(login, "octocat");
    }

    #[test]
    fn test_github_type_plugins() {
        let github = GitHub::new(Options::default()).expect("client");
        assert_eq!(github_type().plugin_count(), 2);
        assert_eq!(
            github.client().property::<&str>("api_version"),
            Some(&API_VERSION)
        );
        assert_eq!(github.client().hook().len("request"), 2);
    }
}
