use chrono::{DateTime, SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Everything the server persists, stored as one pretty-printed JSON file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, deserialize_with = "lenient_ideas")]
    pub suggested_ideas: Vec<Idea>,
    #[serde(default, deserialize_with = "lenient_snapshot")]
    pub repo_cache: Option<StatusSnapshot>,
    #[serde(default, serialize_with = "iso_millis::option")]
    pub last_checked: Option<DateTime<Utc>>,
}

/// An idea as supplied by a caller, before the store assigns metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IdeaDraft {
    /// Name of the app idea
    pub name: String,
    /// Detailed description of the app
    pub description: String,
    /// Key features of the app
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    /// Category (e.g. productivity, entertainment, utility)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A stored idea.
///
/// `id` is for display only. Callers address ideas by their position in
/// [`Document::suggested_ideas`], see [`crate::ideas::IdeaRepository::iterate`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub id: String,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub generated_at: DateTime<Utc>,
}

impl Idea {
    pub fn from_draft(draft: IdeaDraft, id: String, generated_at: DateTime<Utc>) -> Self {
        Self {
            name: draft.name,
            description: draft.description,
            features: draft.features,
            category: draft.category,
            id,
            generated_at,
        }
    }
}

/// An idea annotated with its position in the full, unfiltered collection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndexedIdea {
    pub index: usize,
    #[serde(flatten)]
    pub idea: Idea,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaListing {
    pub total_ideas: usize,
    pub filtered_ideas: usize,
    pub returned_ideas: usize,
    pub ideas: Vec<IndexedIdea>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendOutcome {
    pub saved_count: usize,
    pub total_ideas: usize,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Iteration {
    pub original_idea: Idea,
    pub iteration_direction: String,
}

/// Repository metadata as returned by `GET /repos/{owner}/{name}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoInfo {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    pub updated_at: Option<String>,
    pub language: Option<String>,
    pub default_branch: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub message: String,
    pub author: String,
    pub date: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Recursive tree listing as returned by `GET /repos/{repo}/git/trees/{ref}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoTree {
    #[serde(default)]
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

impl RepoTree {
    /// Directories that sit directly at the repository root.
    pub fn top_level_folders(&self) -> Vec<String> {
        self.tree
            .iter()
            .filter(|entry| entry.kind == "tree" && !entry.path.contains('/'))
            .map(|entry| entry.path.clone())
            .collect()
    }
}

/// Result of one round of remote fetches. Each part is independent and is
/// `None`/empty when its fetch failed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStatus {
    pub repo_info: Option<RepoInfo>,
    #[serde(default)]
    pub commits: Vec<CommitSummary>,
    pub structure: Option<RepoTree>,
    pub readme: Option<String>,
}

/// The cached copy of the last [`RemoteStatus`], replaced wholesale on refresh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(flatten)]
    pub status: RemoteStatus,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub updated: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedStatus {
    pub repo_cache: Option<StatusSnapshot>,
    #[serde(serialize_with = "iso_millis::option")]
    pub last_checked: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaStats {
    pub total_ideas_generated: usize,
    #[serde(serialize_with = "iso_millis::option")]
    pub last_checked: Option<DateTime<Utc>>,
    pub repo_last_updated: String,
}

impl IdeaStats {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            total_ideas_generated: doc.suggested_ideas.len(),
            last_checked: doc.last_checked,
            repo_last_updated: doc
                .repo_cache
                .as_ref()
                .map(|snapshot| snapshot.updated.to_rfc3339_opts(SecondsFormat::Millis, true))
                .unwrap_or_else(|| "Never".to_string()),
        }
    }
}

// Ideas that no longer fit the schema are skipped one by one so the rest
// survive the next write.
fn lenient_ideas<'de, D>(deserializer: D) -> Result<Vec<Idea>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match serde_json::from_value(value) {
            Ok(idea) => Some(idea),
            Err(error) => {
                tracing::warn!(position, %error, "skipping malformed stored idea");
                None
            }
        })
        .collect())
}

/// Timestamps are written as `2025-01-01T00:00:00.000Z`, always with
/// millisecond precision.
mod iso_millis {
    use super::*;

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn option<S: Serializer>(
        at: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match at {
            Some(at) => serialize(at, serializer),
            None => serializer.serialize_none(),
        }
    }
}

// A cache written in another shape is dropped instead of discarding the ideas.
fn lenient_snapshot<'de, D>(deserializer: D) -> Result<Option<StatusSnapshot>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}
