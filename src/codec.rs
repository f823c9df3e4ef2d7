//! Export/import document codec
//!
//! A session exports as a pretty-printed JSON document holding a title, the
//! ordered messages and the export time. Import is all-or-nothing: the
//! document either parses completely or the caller gets a [`CodecError`].

use crate::session::Message;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Title used when the caller does not supply one
pub const DEFAULT_TITLE: &str = "AI Chat Assistant";

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Invalid chat file format: {0}")]
    Format(#[from] serde_json::Error),
    #[error("Invalid chat file format: duplicate message id {0}")]
    DuplicateId(String),
}

/// Exported session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub title: String,
    pub messages: Vec<Message>,
    pub export_date: DateTime<Utc>,
}

pub fn export_json(document: &ExportDocument) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(document)?)
}

pub fn import_json(text: &str) -> Result<ExportDocument, CodecError> {
    let document: ExportDocument = serde_json::from_str(text)?;

    let duplicate = {
        let mut seen = HashSet::new();
        document
            .messages
            .iter()
            .find(|m| !seen.insert(m.id.as_str()))
            .map(|m| m.id.clone())
    };
    if let Some(id) = duplicate {
        return Err(CodecError::DuplicateId(id));
    }

    Ok(document)
}

/// Download name for an export made on `date`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("chat-export-{}.json", date.format("%Y-%m-%d"))
}
