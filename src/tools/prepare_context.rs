use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ServiceResult;
use crate::github::gather_status;
use crate::ideas::IdeaRepository;
use crate::status::StatusCache;
use crate::tools::{DEFAULT_REPO_DESCRIPTION, ToolContext};

const RECENT_CHANGES: usize = 5;
const DEFAULT_FOCUS: &str = "diverse";

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrepareContextParams {
    /// Optional focus area for ideas (e.g. "productivity", "entertainment",
    /// "utilities", "health"). Leave empty for diverse ideas.
    #[serde(default)]
    pub focus_area: Option<String>,
}

/// Fetches the repository, refreshes the cached status and hands the
/// generator everything it needs to propose a new batch of ideas.
pub fn run(params: PrepareContextParams, ctx: &ToolContext) -> ServiceResult<Value> {
    let focus_area = params
        .focus_area
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FOCUS.to_string());

    let snapshot = StatusCache::new(&ctx.store).refresh(gather_status(ctx.source.as_ref()))?;
    let already_suggested = IdeaRepository::new(&ctx.store).count();
    let status = &snapshot.status;

    let recent_commits: Vec<&str> = status
        .commits
        .iter()
        .take(RECENT_CHANGES)
        .map(|c| c.message.as_str())
        .collect();
    let file_structure: Vec<&str> = status
        .structure
        .iter()
        .flat_map(|tree| tree.tree.iter())
        .map(|entry| entry.path.as_str())
        .collect();
    let main_folders = status
        .structure
        .as_ref()
        .map(|tree| tree.top_level_folders())
        .unwrap_or_default();
    let batch = ctx.settings.ideas_per_batch;

    Ok(json!({
        "message": format!("Ready to generate {batch} unique Rabbit R1 creation app ideas"),
        "context": {
            "repoDescription": status
                .repo_info
                .as_ref()
                .and_then(|info| info.description.as_deref())
                .unwrap_or(DEFAULT_REPO_DESCRIPTION),
            "recentCommits": recent_commits,
            "fileStructure": file_structure,
            "readmeContent": status.readme.as_deref().unwrap_or_default(),
            "alreadySuggested": already_suggested,
            "focusArea": focus_area,
        },
        "instructions": [
            format!("Generate exactly {batch} creative, unique app ideas for Rabbit R1 creations"),
            "Each idea should include: name, description, features (array), category",
            format!("Focus area: {focus_area}"),
            "Consider the current SDK structure and available features",
            "Avoid repeating any of the previously suggested ideas",
            format!("Total ideas already suggested: {already_suggested}"),
            "Make ideas innovative, practical, and aligned with Rabbit R1 capabilities",
            "Consider the device's unique form factor, voice interface, and portability",
            "**IMPORTANT**: After generating ideas, you MUST call the save-ideas tool with the ideas array to save them to memory",
            "Format each idea as: { name: string, description: string, features: string[], category: string }",
        ],
        "repoStructure": {
            "mainFolders": main_folders,
            "recentChanges": recent_commits,
            "totalFiles": file_structure.len(),
        },
        "previousIdeasCount": already_suggested,
    }))
}
