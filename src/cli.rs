use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::github::{DEFAULT_API_URL, DEFAULT_REPO, DEFAULT_TREE_BRANCH, GitHubConfig};
use crate::metadata::{PKG_DESCRIPTION, PKG_NAME, PKG_VERSION};
use crate::storage::DocumentStore;
use crate::tools::{DEFAULT_IDEAS_PER_BATCH, IdeaSettings};

#[derive(Parser, Debug, Clone)]
#[command(name = PKG_NAME)]
#[command(version = PKG_VERSION)]
#[command(about = PKG_DESCRIPTION, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Server arguments used when no subcommand is given
    #[command(flatten)]
    pub start: CommandArguments,
}

impl Cli {
    /// The subcommand to run; a bare invocation starts the server.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Start(self.start))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the MCP server (the default)
    Start(CommandArguments),
    /// Save a JSON array of ideas to the store
    Save(SaveArguments),
    /// Print statistics about the stored ideas
    Stats(StoreArguments),
    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct StoreArguments {
    /// Path of the JSON document holding ideas and the repository cache
    #[arg(long, env = "IDEAS_STORAGE_FILE")]
    pub storage_file: Option<PathBuf>,
}

impl StoreArguments {
    pub fn store(&self) -> DocumentStore {
        match &self.storage_file {
            Some(path) => DocumentStore::new(path.clone()),
            None => DocumentStore::default(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SaveArguments {
    /// Ideas as JSON, e.g. '[{"name": "...", "description": "..."}]'
    pub ideas_json: String,

    #[command(flatten)]
    pub store: StoreArguments,
}

#[derive(Args, Debug, Clone)]
pub struct CommandArguments {
    #[command(flatten)]
    pub store: StoreArguments,

    /// GitHub repository the ideas are generated for, as owner/name
    #[arg(long, env = "IDEAS_GITHUB_REPO", default_value = DEFAULT_REPO)]
    pub github_repo: String,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub github_api_url: String,

    /// Branch whose file tree is listed
    #[arg(long, env = "IDEAS_TREE_BRANCH", default_value = DEFAULT_TREE_BRANCH)]
    pub tree_branch: String,

    /// Number of ideas requested per generation round
    #[arg(long, env = "IDEAS_PER_BATCH", default_value_t = DEFAULT_IDEAS_PER_BATCH)]
    pub ideas_per_batch: usize,

    /// Enable stdio transport
    #[arg(long, env = "MCP_ENABLE_STDIO", default_value_t = true, action = clap::ArgAction::Set)]
    pub enable_stdio: bool,

    /// Enable streamable HTTP transport
    #[arg(long, env = "MCP_ENABLE_HTTP", default_value_t = false, action = clap::ArgAction::Set)]
    pub enable_http: bool,

    /// HTTP bind address (streamable HTTP)
    #[arg(long, env = "MCP_HTTP_ADDR", default_value = "127.0.0.1:8080")]
    pub http_addr: String,
}

impl CommandArguments {
    pub fn default_settings() -> Self {
        Self {
            store: StoreArguments { storage_file: None },
            github_repo: DEFAULT_REPO.to_string(),
            github_api_url: DEFAULT_API_URL.to_string(),
            tree_branch: DEFAULT_TREE_BRANCH.to_string(),
            ideas_per_batch: DEFAULT_IDEAS_PER_BATCH,
            enable_stdio: true,
            enable_http: false,
            http_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Validate CLI/environment-derived arguments.
    pub fn validate(&self) -> Result<(), String> {
        if !self.enable_stdio && !self.enable_http {
            return Err("Enable at least one transport (stdio or http)".to_string());
        }

        if self.enable_http {
            self.http_addr
                .parse::<SocketAddr>()
                .map_err(|e| format!("Invalid MCP_HTTP_ADDR '{}': {e}", self.http_addr))?;
        }

        let mut parts = self.github_repo.split('/');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(name), None) if !owner.trim().is_empty() && !name.trim().is_empty()
        );
        if !well_formed {
            return Err(format!(
                "Invalid IDEAS_GITHUB_REPO '{}': expected owner/name",
                self.github_repo
            ));
        }

        if self.ideas_per_batch == 0 {
            return Err("IDEAS_PER_BATCH must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn github_config(&self) -> GitHubConfig {
        GitHubConfig {
            api_url: self.github_api_url.clone(),
            repo: self.github_repo.clone(),
            tree_branch: self.tree_branch.clone(),
        }
    }

    pub fn idea_settings(&self) -> IdeaSettings {
        IdeaSettings {
            repo_name: self.github_config().repo_name().to_string(),
            ideas_per_batch: self.ideas_per_batch,
        }
    }
}
