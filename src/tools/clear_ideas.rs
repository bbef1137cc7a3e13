use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ServiceResult;
use crate::ideas::{IdeaRepository, parse_confirmation};
use crate::tools::ToolContext;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClearIdeasParams {
    /// Must be the boolean `true` to confirm clearing the history
    #[serde(default)]
    #[schemars(with = "bool")]
    pub confirm: Value,
}

pub fn run(params: ClearIdeasParams, ctx: &ToolContext) -> ServiceResult<Value> {
    let cleared = IdeaRepository::new(&ctx.store).clear(parse_confirmation(&params.confirm))?;
    Ok(json!({
        "message": "Idea history cleared successfully",
        "clearedCount": cleared,
    }))
}
