use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ServiceResult;
use crate::ideas::{IdeaRepository, parse_drafts};
use crate::tools::ToolContext;
use crate::types::IdeaDraft;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SaveIdeasParams {
    /// Ideas to save. Each needs a name and a description; features and
    /// category are optional.
    #[serde(default)]
    #[schemars(with = "Vec<IdeaDraft>")]
    pub ideas: Value,
}

pub fn run(params: SaveIdeasParams, ctx: &ToolContext) -> ServiceResult<Value> {
    let drafts = parse_drafts(&params.ideas)?;
    let outcome = IdeaRepository::new(&ctx.store).append(drafts)?;
    Ok(json!({
        "message": "Ideas saved successfully",
        "savedCount": outcome.saved_count,
        "totalIdeas": outcome.total_ideas,
        "timestamp": outcome.timestamp,
    }))
}
