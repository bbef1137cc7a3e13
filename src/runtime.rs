use std::net::SocketAddr;
use std::sync::Arc;

use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder,
    service::TowerToHyperService,
};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{ServiceExt, transport::stdio};
use tokio::task::JoinHandle;

use crate::cli::CommandArguments;
use crate::error::{ServiceError, ServiceResult};
use crate::github::GitHubClient;
use crate::server::IdeasServer;
use crate::tools::ToolContext;

/// Builds the server from `args`, makes sure the idea document exists and
/// serves every enabled transport until they all stop.
pub async fn start_server(args: CommandArguments) -> ServiceResult<()> {
    args.validate().map_err(ServiceError::FromString)?;

    let store = args.store.store();
    if store.ensure_exists()? {
        tracing::info!(path = %store.path().display(), "initialized idea storage");
    }

    let github = args.github_config();
    tracing::info!(repo = %github.repo, storage = %store.path().display(), "starting ideas MCP server");
    let context = ToolContext::new(
        store,
        Arc::new(GitHubClient::new(&github)),
        args.idea_settings(),
    );
    let server = IdeasServer::new(context);

    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    if args.enable_stdio {
        let running = server
            .clone()
            .serve(stdio())
            .await
            .map_err(|e| ServiceError::FromString(format!("stdio transport failed: {e}")))?;
        handles.push(tokio::spawn(async move {
            if let Err(e) = running.waiting().await {
                tracing::error!(error = %e, "stdio transport stopped unexpectedly");
            }
        }));
    }

    if args.enable_http {
        let addr: SocketAddr = args
            .http_addr
            .parse()
            .map_err(|e| ServiceError::FromString(format!("Invalid MCP_HTTP_ADDR: {e}")))?;
        handles.push(serve_http(server, addr).await?);
    }

    for handle in handles {
        let _ = handle.await;
    }
    tracing::info!("all transports closed");
    Ok(())
}

// Streamable HTTP via rmcp's tower service, one session per client.
async fn serve_http(server: IdeasServer, addr: SocketAddr) -> ServiceResult<JoinHandle<()>> {
    let http_service = TowerToHyperService::new(StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    ));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "streamable HTTP transport listening");

    Ok(tokio::spawn(async move {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept HTTP connection");
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let service = http_service.clone();
            tokio::spawn(async move {
                if let Err(e) = Builder::new(TokioExecutor::default())
                    .serve_connection(io, service)
                    .await
                {
                    tracing::debug!(%peer, error = %e, "HTTP connection closed with error");
                }
            });
        }
    }))
}
