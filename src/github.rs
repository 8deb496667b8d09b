//! GitHub API helpers for posting the coverage comment on pull requests.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use serde::Deserialize;

pub const DEFAULT_COMMENT_MARKER: &str = "<!-- covgate-comment -->";

const DEFAULT_API_URL: &str = "https://api.github.com";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const PER_PAGE: usize = 100;

/// What the runner environment tells us about the repository and pull
/// request. Every field is optional because the binary also runs locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub api_url: String,
    pub repo: Option<String>,
    pub pr_number: Option<u64>,
    pub sha: Option<String>,
}

/// The subset of the workflow event payload we read.
#[derive(Deserialize, Default)]
struct EventPayload {
    number: Option<u64>,
    pull_request: Option<EventPullRequest>,
}

#[derive(Deserialize)]
struct EventPullRequest {
    number: Option<u64>,
    head: Option<EventHead>,
}

#[derive(Deserialize)]
struct EventHead {
    sha: Option<String>,
}

impl Environment {
    /// Read standard GitHub Actions variables (`GITHUB_API_URL`,
    /// `GITHUB_REPOSITORY`, `GITHUB_EVENT_PATH`, `GITHUB_REF`, `GITHUB_SHA`).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let payload = var("GITHUB_EVENT_PATH")
            .and_then(|path| match read_event_payload(Path::new(&path)) {
                Ok(payload) => Some(payload),
                Err(e) => {
                    tracing::warn!("ignoring event payload: {e:#}");
                    None
                }
            })
            .unwrap_or_default();

        let pr_number = payload
            .number
            .or_else(|| payload.pull_request.as_ref().and_then(|pr| pr.number))
            .or_else(|| var("GITHUB_REF").as_deref().and_then(pr_number_from_ref));

        // On pull_request events GITHUB_SHA is the synthetic merge commit;
        // the head commit is what users can browse.
        let sha = payload
            .pull_request
            .and_then(|pr| pr.head)
            .and_then(|head| head.sha)
            .or_else(|| var("GITHUB_SHA"));

        Self {
            api_url: var("GITHUB_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            repo: var("GITHUB_REPOSITORY"),
            pr_number,
            sha,
        }
    }
}

fn read_event_payload(path: &Path) -> Result<EventPayload> {
    let raw = std::fs::read(path)
        .with_context(|| format!("Failed to read event payload {}", path.display()))?;
    serde_json::from_slice(&raw).context("Failed to parse event payload JSON")
}

/// Extract PR number from GITHUB_REF (e.g. "refs/pull/42/merge" → 42).
fn pr_number_from_ref(github_ref: &str) -> Option<u64> {
    let parts: Vec<&str> = github_ref.split('/').collect();
    if parts.len() >= 3 && parts[0] == "refs" && parts[1] == "pull" {
        parts[2].parse().ok()
    } else {
        None
    }
}

/// How the remote API classifies a comment's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum AuthorKind {
    Bot,
    User,
    Organization,
    Other,
}

impl From<String> for AuthorKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "Bot" => AuthorKind::Bot,
            "User" => AuthorKind::User,
            "Organization" => AuthorKind::Organization,
            _ => AuthorKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Author {
    pub login: String,
    #[serde(rename = "type")]
    pub kind: AuthorKind,
}

impl Author {
    pub fn is_bot(&self) -> bool {
        self.kind == AuthorKind::Bot
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub body: Option<String>,
    pub user: Option<Author>,
}

impl Comment {
    /// Whether this is a comment we posted earlier: bot-authored and carrying
    /// the marker.
    pub fn is_marker_comment(&self, marker: &str) -> bool {
        let by_bot = self.user.as_ref().is_some_and(Author::is_bot);
        let has_marker = self.body.as_deref().is_some_and(|b| b.contains(marker));
        by_bot && has_marker
    }
}

/// The three comment operations the publisher needs, scoped to a single
/// pull request thread.
pub trait CommentApi {
    /// All comments on the thread, in listing order.
    fn list_comments(&self) -> Result<Vec<Comment>>;
    fn create_comment(&self, body: &str) -> Result<()>;
    fn update_comment(&self, comment_id: u64, body: &str) -> Result<()>;
}

/// What [`upsert_comment`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated(u64),
}

/// Prefix `message` with `marker` unless it already contains it, so the
/// posted text is always found again by the next run.
#[must_use]
pub fn with_marker(marker: &str, message: &str) -> String {
    if message.contains(marker) {
        message.to_string()
    } else {
        format!("{marker}\n{message}")
    }
}

/// Update our previous comment on the thread, or create one if there is
/// none. The first matching comment in listing order wins.
pub fn upsert_comment(api: &dyn CommentApi, marker: &str, message: &str) -> Result<Upsert> {
    let body = with_marker(marker, message);
    let existing = api
        .list_comments()?
        .into_iter()
        .find(|c| c.is_marker_comment(marker));

    match existing {
        Some(comment) => {
            api.update_comment(comment.id, &body)?;
            Ok(Upsert::Updated(comment.id))
        }
        None => {
            api.create_comment(&body)?;
            Ok(Upsert::Created)
        }
    }
}

/// REST client bound to one pull request.
pub struct GitHubClient {
    agent: ureq::Agent,
    token: String,
    api_url: String,
    repo: String,
    pr_number: u64,
}

impl GitHubClient {
    pub fn new(token: &str, api_url: &str, repo: &str, pr_number: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(HTTP_TIMEOUT)
            .user_agent("covgate")
            .build();
        Self {
            agent,
            token: token.to_string(),
            api_url: api_url.to_string(),
            repo: repo.to_string(),
            pr_number,
        }
    }

    /// Build a client from the runner environment. `None` when the run is not
    /// attached to a pull request.
    pub fn from_environment(token: &str, env: &Environment) -> Option<Self> {
        let repo = env.repo.as_deref()?;
        let pr_number = env.pr_number?;
        Some(Self::new(token, &env.api_url, repo, pr_number))
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn pr_number(&self) -> u64 {
        self.pr_number
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("X-GitHub-Api-Version", "2022-11-28")
    }

    fn send_body(&self, method: &str, url: &str, body: &str, action: &str) -> Result<()> {
        let resp = self
            .request(method, url)
            .send_json(serde_json::json!({ "body": body }));
        match resp {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                bail!("GitHub API error {action} comment (HTTP {code}): {body}");
            }
            Err(e) => bail!("Failed {action} comment: {e}"),
        }
    }
}

impl CommentApi for GitHubClient {
    fn list_comments(&self) -> Result<Vec<Comment>> {
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let url = format!(
                "{}/repos/{}/issues/{}/comments?per_page={}&page={}",
                self.api_url, self.repo, self.pr_number, PER_PAGE, page
            );
            let resp = self
                .request("GET", &url)
                .call()
                .context("Failed to list PR comments")?;

            let comments: Vec<Comment> =
                resp.into_json().context("Failed to parse comments JSON")?;
            let last_page = comments.len() < PER_PAGE;
            all.extend(comments);
            if last_page {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    fn create_comment(&self, body: &str) -> Result<()> {
        let url = format!(
            "{}/repos/{}/issues/{}/comments",
            self.api_url, self.repo, self.pr_number
        );
        self.send_body("POST", &url, body, "creating")
    }

    fn update_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        let url = format!(
            "{}/repos/{}/issues/comments/{}",
            self.api_url, self.repo, comment_id
        );
        self.send_body("PATCH", &url, body, "updating")
    }
}
