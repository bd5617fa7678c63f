//! Token list persistence
//!
//! The list is always read and written as a whole document.

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::{format_token_list, parse_token_list, LineaTokenList};

#[async_trait]
pub trait TokenListStore: Send + Sync {
    async fn read(&self) -> Result<LineaTokenList>;

    async fn write(&self, list: &LineaTokenList) -> Result<()>;

    /// Where the list lives, for log output
    fn describe(&self) -> String;
}

/// JSON file on local disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenListStore for JsonFileStore {
    async fn read(&self) -> Result<LineaTokenList> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .wrap_err_with(|| format!("Failed to read token list {}", self.path.display()))?;
        let list = parse_token_list(&raw)
            .wrap_err_with(|| format!("Invalid token list {}", self.path.display()))?;

        debug!(path = %self.path.display(), tokens = list.tokens.len(), "Token list loaded");
        Ok(list)
    }

    async fn write(&self, list: &LineaTokenList) -> Result<()> {
        let json = format_token_list(list)?;
        tokio::fs::write(&self.path, json)
            .await
            .wrap_err_with(|| format!("Failed to write token list {}", self.path.display()))?;

        debug!(path = %self.path.display(), tokens = list.tokens.len(), "Token list saved");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
