//! Application state shared by every request handler.
//!
//! Holds configuration and the optional LLM client. Database access is a
//! fresh SQLite connection per call to [`CoreState::open_db`].

use std::sync::Arc;

use rusqlite::Connection;

use crate::config::Config;
use crate::db::{self, DatabaseError};
use crate::gemini::{GeminiClient, LlmClient, LlmError};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    pub config: Config,
    /// `None` when no Gemini API key is configured.
    llm: Option<Arc<dyn LlmClient>>,
}

impl CoreState {
    /// Build state from configuration, creating the Gemini client when a
    /// key is present.
    pub fn new(config: Config) -> Self {
        let llm: Option<Arc<dyn LlmClient>> = match GeminiClient::from_config(&config.gemini) {
            Ok(client) => {
                tracing::info!(model = %config.gemini.model, "AI assistant enabled");
                Some(Arc::new(client))
            }
            Err(LlmError::NotConfigured) => {
                tracing::warn!("GEMINI_API_KEY not set, AI assistant disabled");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build Gemini client, AI assistant disabled");
                None
            }
        };
        Self { config, llm }
    }

    /// State with an explicit LLM client (tests, embedding).
    pub fn with_llm(config: Config, llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self { config, llm }
    }

    pub fn llm(&self) -> Option<&dyn LlmClient> {
        self.llm.as_deref()
    }

    /// Open a connection to the configured database. Migrations are applied
    /// on open, so the first call also creates the schema.
    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        db::open_database(&self.config.db_path)
    }

    /// Open the database once at startup so schema problems fail fast.
    pub fn init_database(&self) -> Result<(), DatabaseError> {
        let conn = self.open_db()?;
        let version = db::get_current_version(&conn);
        tracing::info!(
            path = %self.config.db_path.display(),
            schema_version = version,
            "Database ready"
        );
        Ok(())
    }
}
