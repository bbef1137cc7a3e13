//! GitHub REST client for the repository the ideas are generated against.
//!
//! Provides four independent, best-effort reads:
//! - repository metadata
//! - the most recent commits
//! - the recursive file tree
//! - the raw README
//!
//! A failing read never fails the others; [`gather_status`] folds them into
//! one [`RemoteStatus`] with empty placeholders for whatever was unavailable.

use serde::Deserialize;
use thiserror::Error;

use crate::metadata::PKG_USER_AGENT;
use crate::types::{CommitSummary, RemoteStatus, RepoInfo, RepoTree};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_REPO: &str = "rabbit-hmi-oss/creations-sdk";
pub const DEFAULT_TREE_BRANCH: &str = "main";
pub const COMMIT_LIMIT: usize = 10;

const RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Why a remote read produced nothing.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("GitHub API error: {0}")]
    Status(u16),
    #[error("GitHub request failed: {0}")]
    Transport(String),
    #[error("GitHub response could not be decoded: {0}")]
    Decode(String),
}

/// Source of repository status. Implemented by [`GitHubClient`]; tests plug
/// in canned sources.
pub trait RepoSource: Send + Sync {
    fn repository(&self) -> Result<RepoInfo, RemoteError>;
    fn recent_commits(&self) -> Result<Vec<CommitSummary>, RemoteError>;
    fn tree(&self) -> Result<RepoTree, RemoteError>;
    fn readme(&self) -> Result<String, RemoteError>;
}

/// Runs all four reads and keeps whatever succeeded.
pub fn gather_status(source: &dyn RepoSource) -> RemoteStatus {
    RemoteStatus {
        repo_info: available("repository", source.repository()),
        commits: available("commits", source.recent_commits()).unwrap_or_default(),
        structure: available("tree", source.tree()),
        readme: available("readme", source.readme()),
    }
}

fn available<T>(part: &'static str, result: Result<T, RemoteError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(part, %error, "GitHub data unavailable");
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    /// `owner/name`
    pub repo: String,
    pub tree_branch: String,
}

impl GitHubConfig {
    /// The `name` half of the `owner/name` coordinate.
    pub fn repo_name(&self) -> &str {
        self.repo.rsplit('/').next().unwrap_or(&self.repo)
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            repo: DEFAULT_REPO.to_string(),
            tree_branch: DEFAULT_TREE_BRANCH.to_string(),
        }
    }
}

pub struct GitHubClient {
    repo_url: String,
    tree_branch: String,
    agent: ureq::Agent,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Self {
        let repo_url = format!(
            "{}/repos/{}",
            config.api_url.trim_end_matches('/'),
            config.repo.trim_matches('/')
        );
        Self {
            repo_url,
            tree_branch: config.tree_branch.clone(),
            agent: ureq::AgentBuilder::new().user_agent(PKG_USER_AGENT).build(),
        }
    }

    fn get(&self, path: &str, accept: &str) -> Result<ureq::Response, RemoteError> {
        let url = format!("{}{}", self.repo_url, path);
        tracing::debug!(%url, "GitHub request");
        self.agent
            .get(&url)
            .set("Accept", accept)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => RemoteError::Status(code),
                ureq::Error::Transport(transport) => RemoteError::Transport(transport.to_string()),
            })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        self.get(path, JSON_MEDIA_TYPE)?
            .into_json()
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

impl RepoSource for GitHubClient {
    fn repository(&self) -> Result<RepoInfo, RemoteError> {
        self.get_json("")
    }

    fn recent_commits(&self) -> Result<Vec<CommitSummary>, RemoteError> {
        let commits: Vec<CommitEnvelope> =
            self.get_json(&format!("/commits?per_page={COMMIT_LIMIT}"))?;
        Ok(commits
            .into_iter()
            .take(COMMIT_LIMIT)
            .map(summarize_commit)
            .collect())
    }

    fn tree(&self) -> Result<RepoTree, RemoteError> {
        self.get_json(&format!("/git/trees/{}?recursive=1", self.tree_branch))
    }

    fn readme(&self) -> Result<String, RemoteError> {
        self.get("/readme", RAW_MEDIA_TYPE)?
            .into_string()
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

// Wire shape of one entry of `GET /repos/{repo}/commits`.
#[derive(Deserialize)]
struct CommitEnvelope {
    commit: CommitBody,
}

#[derive(Deserialize)]
struct CommitBody {
    message: String,
    author: Option<CommitAuthor>,
}

#[derive(Deserialize)]
struct CommitAuthor {
    name: Option<String>,
    date: Option<String>,
}

fn summarize_commit(envelope: CommitEnvelope) -> CommitSummary {
    let (author, date) = match envelope.commit.author {
        Some(author) => (author.name, author.date),
        None => (None, None),
    };
    CommitSummary {
        message: envelope.commit.message,
        author: author.unwrap_or_else(|| "Unknown".to_string()),
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct PartialSource {
        fail_commits: bool,
        fail_tree: bool,
    }

    impl RepoSource for PartialSource {
        fn repository(&self) -> Result<RepoInfo, RemoteError> {
            Ok(RepoInfo {
                name: "creations-sdk".into(),
                stargazers_count: 12,
                ..RepoInfo::default()
            })
        }

        fn recent_commits(&self) -> Result<Vec<CommitSummary>, RemoteError> {
            if self.fail_commits {
                return Err(RemoteError::Status(500));
            }
            Ok(vec![CommitSummary {
                message: "add qr demo".into(),
                author: "dev".into(),
                date: Some("2025-01-01T00:00:00Z".into()),
            }])
        }

        fn tree(&self) -> Result<RepoTree, RemoteError> {
            if self.fail_tree {
                return Err(RemoteError::Transport("connection refused".into()));
            }
            Ok(RepoTree::default())
        }

        fn readme(&self) -> Result<String, RemoteError> {
            Err(RemoteError::Status(404))
        }
    }

    #[test]
    fn gather_keeps_successful_parts() {
        let status = gather_status(&PartialSource {
            fail_commits: true,
            fail_tree: false,
        });
        assert_eq!(status.repo_info.unwrap().stargazers_count, 12);
        assert!(status.commits.is_empty());
        assert!(status.structure.is_some());
        assert!(status.readme.is_none());

        let status = gather_status(&PartialSource {
            fail_commits: false,
            fail_tree: true,
        });
        assert_eq!(status.commits.len(), 1);
        assert!(status.structure.is_none());
    }

    #[test]
    fn commit_wire_shape_is_flattened() {
        let wire: Vec<CommitEnvelope> = serde_json::from_value(json!([
            {
                "sha": "abc",
                "commit": {
                    "message": "fix plugin demo",
                    "author": { "name": "Ada", "email": "ada@example.com", "date": "2025-02-01T10:00:00Z" }
                }
            },
            { "sha": "def", "commit": { "message": "anonymous", "author": null } }
        ]))
        .unwrap();
        let commits: Vec<CommitSummary> = wire.into_iter().map(summarize_commit).collect();
        assert_eq!(commits[0].author, "Ada");
        assert_eq!(commits[0].date.as_deref(), Some("2025-02-01T10:00:00Z"));
        assert_eq!(commits[1].author, "Unknown");
    }

    #[test]
    fn client_urls_tolerate_trailing_slashes() {
        let client = GitHubClient::new(&GitHubConfig {
            api_url: "http://localhost:9/".into(),
            repo: "owner/name".into(),
            tree_branch: "dev".into(),
        });
        assert_eq!(client.repo_url, "http://localhost:9/repos/owner/name");
        assert_eq!(GitHubConfig::default().repo_name(), "creations-sdk");
    }
}
