use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ServiceError, ServiceResult};
use crate::ideas::{IdeaQuery, IdeaRepository};
use crate::tools::ToolContext;

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListIdeasParams {
    /// Number of most recent (matching) ideas to return. Omit or 0 for all.
    #[serde(default)]
    #[schemars(with = "Option<u64>")]
    pub limit: Value,
    /// Keyword matched case-insensitively against every field of an idea
    #[serde(default)]
    pub search: Option<String>,
}

pub fn run(params: ListIdeasParams, ctx: &ToolContext) -> ServiceResult<Value> {
    let listing = IdeaRepository::new(&ctx.store).list(&IdeaQuery {
        limit: parse_limit(&params.limit)?,
        search: params.search,
    });
    Ok(serde_json::to_value(listing)?)
}

// Absent or null means no limit. `2.0` counts as 2; negatives and fractions are rejected.
fn parse_limit(raw: &Value) -> ServiceResult<Option<usize>> {
    if raw.is_null() {
        return Ok(None);
    }
    raw.as_u64()
        .or_else(|| {
            raw.as_f64()
                .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n < u64::MAX as f64)
                .map(|n| n as u64)
        })
        .and_then(|n| usize::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| {
            ServiceError::Validation(format!("limit must be a non-negative integer, got {raw}"))
        })
}
