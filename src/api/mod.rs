//! Web front end: the generator page plus a small JSON API.
//!
//! Routes:
//! - `GET /` renders the form and the session's history
//! - `POST /` runs the pipeline for the submitted topic
//! - `POST /v1/generate` runs the pipeline, JSON in and out
//! - `GET /v1/history` returns the session's transcripts

mod handlers;
pub mod page;
pub mod session;
mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::{chat::ChatProvider, error::LLMError};
use handlers::{handle_generate, handle_history, handle_index, handle_submit};
use page::PageRenderer;
use session::SessionStore;

pub use types::{ErrorResponse, GenerateForm, GenerateRequest};

/// Main server struct: the provider every session's chain talks to.
pub struct Server {
    llm: Arc<dyn ChatProvider>,
    pages: Arc<PageRenderer>,
}

/// Internal server state shared between request handlers
#[derive(Clone)]
struct ServerState {
    sessions: Arc<SessionStore>,
    pages: Arc<PageRenderer>,
}

impl Server {
    /// Creates a new server instance around the given provider
    pub fn new(llm: Arc<dyn ChatProvider>) -> Result<Self, LLMError> {
        Ok(Self {
            llm,
            pages: Arc::new(PageRenderer::new()?),
        })
    }

    /// Builds the router with a fresh, empty session store.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(handle_index).post(handle_submit))
            .route("/v1/generate", post(handle_generate))
            .route("/v1/history", get(handle_history))
            .layer(CorsLayer::permissive())
            .with_state(ServerState {
                sessions: Arc::new(SessionStore::new(self.llm.clone())),
                pages: self.pages.clone(),
            })
    }

    /// Starts the server and listens for requests on the specified address
    ///
    /// # Arguments
    /// * `addr` - Address to bind to (e.g. "127.0.0.1:8501")
    pub async fn run(self, addr: &str) -> Result<(), LLMError> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| LLMError::InvalidRequest(format!("Cannot bind {addr}: {e}")))?;
        log::info!("Serving PYGPT on http://{addr}");

        axum::serve(listener, app)
            .await
            .map_err(|e| LLMError::Generic(e.to_string()))?;

        Ok(())
    }
}
