//! Server Implementation
//!
//! HTTP 服务器启动和管理

use crate::api;
use crate::core::tasks::BackgroundTasks;
use crate::core::{Config, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (for sharing with tests)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        // Create application state if not provided
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await,
        };

        // Start background tasks
        let mut tasks = BackgroundTasks::new();
        state.start_background_tasks(&mut tasks);

        let app = api::router(state);

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Till Server listening on {}", addr);
        tracing::info!("  HTTP API    : http://localhost:{}/api", self.config.http_port);
        tracing::info!("  Relay WS    : ws://localhost:{}/ws", self.config.http_port);

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        // Stop background tasks after the listener drains
        tasks.shutdown().await;

        Ok(())
    }
}
