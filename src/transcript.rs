//! JSON export of a session's conversation history.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::history::InteractionRecord;

/// A serialized session: identifier, model, export time and every record.
#[derive(Debug, Serialize, Deserialize)]
pub struct Transcript {
    pub session_id: String,
    pub model: String,
    pub exported_at: String,
    pub records: Vec<InteractionRecord>,
}

impl Transcript {
    pub fn new(session_id: &str, model: &str, records: &[InteractionRecord]) -> Self {
        Self {
            session_id: session_id.to_string(),
            model: model.to_string(),
            exported_at: Utc::now().to_rfc3339(),
            records: records.to_vec(),
        }
    }

    /// Writes the transcript as pretty JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Fresh identifier for a chat session.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}
