//! The six operations behind the MCP tools. Each module pairs the tool's
//! argument type with a synchronous `run` that returns the JSON result body;
//! `server.rs` decides how successes and failures are reported.

pub mod clear_ideas;
pub mod iterate_idea;
pub mod list_ideas;
pub mod prepare_context;
pub mod repo_status;
pub mod save_ideas;

use std::sync::Arc;

use crate::github::RepoSource;
use crate::storage::DocumentStore;

pub const DEFAULT_IDEAS_PER_BATCH: usize = 20;
/// Shown when GitHub reports no repository description.
pub const DEFAULT_REPO_DESCRIPTION: &str = "Rabbit R1 creations docs for devs";

/// Knobs that shape tool output rather than storage.
#[derive(Clone, Debug)]
pub struct IdeaSettings {
    /// Shown when GitHub does not report the repository name.
    pub repo_name: String,
    /// How many ideas `prepare-ideas-context` asks the generator for.
    pub ideas_per_batch: usize,
}

impl Default for IdeaSettings {
    fn default() -> Self {
        Self {
            repo_name: "creations-sdk".to_string(),
            ideas_per_batch: DEFAULT_IDEAS_PER_BATCH,
        }
    }
}

/// Everything a tool needs, handed to every call.
#[derive(Clone)]
pub struct ToolContext {
    pub store: DocumentStore,
    pub source: Arc<dyn RepoSource>,
    pub settings: IdeaSettings,
}

impl ToolContext {
    pub fn new(store: DocumentStore, source: Arc<dyn RepoSource>, settings: IdeaSettings) -> Self {
        Self {
            store,
            source,
            settings,
        }
    }
}
