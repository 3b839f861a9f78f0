use crate::config::StorageConfig;
use crate::utils::error::{Result, StorageError};
use serde::Deserialize;
use std::path::Path;

/// TOML 檔案格式：所有欄位放在 `[storage]` 表格下
#[derive(Debug, Deserialize)]
struct TomlDocument {
    storage: StorageConfig,
}

impl StorageConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(StorageError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let document: TomlDocument =
            toml::from_str(content).map_err(|e| StorageError::ConfigParseError {
                message: format!("TOML parsing error: {}", e),
            })?;
        Ok(document.storage)
    }

    /// 從 host 傳入的 JSON 選項物件解析配置
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| StorageError::ConfigParseError {
            message: format!("JSON options error: {}", e),
        })
    }
}
