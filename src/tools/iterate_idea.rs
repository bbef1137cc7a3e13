use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{ServiceError, ServiceResult};
use crate::ideas::IdeaRepository;
use crate::tools::ToolContext;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IterateIdeaParams {
    /// The `index` reported by list-ideas for the idea to iterate on
    #[serde(default)]
    #[schemars(with = "i64")]
    pub idea_index: Value,
    /// "expand" (add features), "simplify" (make simpler), "combine" (merge
    /// with other concepts) or "pivot" (change direction). Defaults to "expand".
    #[serde(default)]
    pub iteration_direction: Option<String>,
}

pub fn run(params: IterateIdeaParams, ctx: &ToolContext) -> ServiceResult<Value> {
    let index = parse_index(&params.idea_index)?;
    let iteration = IdeaRepository::new(&ctx.store)
        .iterate(index, params.iteration_direction.as_deref())?;
    let direction = &iteration.iteration_direction;

    Ok(json!({
        "message": format!("Ready to iterate on idea #{index}"),
        "originalIdea": iteration.original_idea,
        "iterationDirection": direction,
        "instructions": [
            format!("Take the original idea and {direction} it"),
            "Generate 3-5 variations based on the iteration direction",
            "Maintain the core concept while exploring new possibilities",
            "Consider how the SDK features could enable these variations",
        ],
    }))
}

// Whole numbers only; `2.0` is accepted, `2.5` and `"2"` are not.
fn parse_index(raw: &Value) -> ServiceResult<i64> {
    raw.as_i64()
        .or_else(|| {
            raw.as_f64()
                .filter(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64)
                .map(|n| n as i64)
        })
        .ok_or_else(|| {
            ServiceError::Validation(format!("ideaIndex must be an integer, got {raw}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_must_be_a_whole_number() {
        assert_eq!(parse_index(&json!(3)).unwrap(), 3);
        assert_eq!(parse_index(&json!(-1)).unwrap(), -1);
        assert_eq!(parse_index(&json!(2.0)).unwrap(), 2);
        for raw in [json!(2.5), json!("2"), Value::Null, json!([1])] {
            assert_eq!(parse_index(&raw).unwrap_err().kind(), "ValidationError");
        }
    }
}
