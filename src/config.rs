//! 配置管理模块
//!
//! 提供TOML配置文件的读取、写入和自动发现功能，以及 API 密钥的解析。

use crate::error::{Result, TranslationError};
use crate::types::TranslationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// 翻译工具配置结构
///
/// ```toml
/// [translation]
/// api_base_url = "https://api.deepseek.com"
/// model = "deepseek-chat"
/// max_chunk_length = 2000
/// max_concurrent_requests = 3
///
/// [translation.retry]
/// max_retries = 3
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationLibConfig {
    /// 翻译配置
    #[serde(default)]
    pub translation: TranslationConfig,
}

impl TranslationLibConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TranslationError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| TranslationError::Config(e.to_string()))
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content =
            toml::to_string_pretty(self).map_err(|e| TranslationError::Config(e.to_string()))?;
        fs::write(path, content).map_err(|source| TranslationError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from multiple possible locations
    pub fn load_from_default_locations() -> Self {
        let possible_paths = [
            "fy-config.toml",
            "translation-config.toml",
            ".fy-config.toml",
        ];

        for path in &possible_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        info!("Loaded configuration from: {}", path);
                        return config;
                    }
                    Err(e) => {
                        warn!("Failed to load config from {}: {}", path, e);
                    }
                }
            }
        }

        info!("No configuration file found, using defaults");
        Self::default()
    }

    /// Generate example configuration file
    pub fn generate_example_config<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::default().save_to_file(path)
    }
}

impl TranslationConfig {
    /// 解析 API 密钥：显式配置 → 密钥文件 → 环境变量
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            return Ok(key.to_string());
        }

        if let Some(path) = &self.api_key_file {
            let content = fs::read_to_string(path).map_err(|source| TranslationError::FileRead {
                path: path.clone(),
                source,
            })?;
            let key = content.trim();
            if key.is_empty() {
                return Err(TranslationError::Config(format!(
                    "密钥文件为空: {}",
                    path.display()
                )));
            }
            return Ok(key.to_string());
        }

        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(TranslationError::Config(format!(
                "未找到 API 密钥，请在配置中设置 api_key / api_key_file 或环境变量 {}",
                self.api_key_env
            ))),
        }
    }
}
