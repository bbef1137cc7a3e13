pub mod cli;
pub mod error;
pub mod github;
pub mod ideas;
pub mod metadata;
pub mod runtime;
pub mod server;
pub mod status;
pub mod storage;
pub mod tools;
pub mod types;
