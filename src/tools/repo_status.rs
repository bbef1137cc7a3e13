use serde_json::{Value, json};

use crate::error::ServiceResult;
use crate::github::gather_status;
use crate::tools::{DEFAULT_REPO_DESCRIPTION, ToolContext};
use crate::types::RemoteStatus;

/// Live repository status. Reads GitHub only; the stored document is left alone.
pub fn run(ctx: &ToolContext) -> ServiceResult<Value> {
    let status = gather_status(ctx.source.as_ref());
    Ok(status_view(&status, &ctx.settings.repo_name))
}

pub fn status_view(status: &RemoteStatus, fallback_name: &str) -> Value {
    let info = status.repo_info.as_ref();
    let name = info
        .map(|i| i.name.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(fallback_name);
    let files: Vec<Value> = status
        .structure
        .iter()
        .flat_map(|tree| tree.tree.iter())
        .map(|entry| json!({ "path": entry.path, "type": entry.kind }))
        .collect();

    json!({
        "repository": {
            "name": name,
            "description": info
                .and_then(|i| i.description.as_deref())
                .unwrap_or(DEFAULT_REPO_DESCRIPTION),
            "stars": info.map_or(0, |i| i.stargazers_count),
            "forks": info.map_or(0, |i| i.forks_count),
            "lastUpdated": info.and_then(|i| i.updated_at.as_deref()).unwrap_or("Unknown"),
            "language": info.and_then(|i| i.language.as_deref()).unwrap_or("Unknown"),
        },
        "recentCommits": status.commits,
        "structure": {
            "totalFiles": files.len(),
            "files": files,
        },
        "readme": status.readme.as_deref().unwrap_or("No README available"),
    })
}
