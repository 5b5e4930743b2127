//! Inventory error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type InventoryResult<T> = std::result::Result<T, InventoryError>;

impl InventoryError {
    pub fn fetch(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }
}
