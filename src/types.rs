//! 类型定义模块
//!
//! 定义翻译流程中使用的配置结构、请求/响应结构和文件任务。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 翻译配置
///
/// 所有字段都有默认值，配置文件中只需写出需要覆盖的部分。
///
/// # 字段说明
///
/// * `api_base_url` - OpenAI 兼容接口的基础地址
/// * `api_key` / `api_key_file` / `api_key_env` - API 密钥来源，按此顺序查找
/// * `model` / `temperature` - 请求使用的模型与采样温度
/// * `max_chunk_length` - 分块阈值（字符数，不含换行）
/// * `max_concurrent_requests` - 同一文件内同时在途的翻译请求上限
/// * `max_requests_per_second` - 每秒最大请求数，小于等于 0 表示不限速
/// * `output_suffix` - 输出文件名/目录名后缀
/// * `extensions` / `include_html` - 参与翻译的扩展名白名单
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub api_base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_file: Option<PathBuf>,
    pub api_key_env: String,
    pub model: String,
    pub temperature: f64,
    pub max_chunk_length: usize,
    pub max_concurrent_requests: usize,
    pub max_requests_per_second: f64,
    pub request_timeout_secs: u64,
    pub output_suffix: String,
    pub extensions: Vec<String>,
    pub include_html: bool,
    pub retry: RetryConfig,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.deepseek.com".to_string(),
            api_key: None,
            api_key_file: None,
            api_key_env: "DEEPSEEK_API_KEY".to_string(),
            model: "deepseek-chat".to_string(),
            temperature: 1.3,
            max_chunk_length: 2000,
            max_concurrent_requests: 3,
            max_requests_per_second: 2.0,
            request_timeout_secs: 120,
            output_suffix: "_fy".to_string(),
            extensions: vec!["md".to_string(), "txt".to_string()],
            include_html: false,
            retry: RetryConfig::default(),
        }
    }
}

impl TranslationConfig {
    /// 实际生效的扩展名白名单（小写，不含点）
    pub fn allowed_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        if self.include_html && !extensions.iter().any(|ext| ext == "html") {
            extensions.push("html".to_string());
        }
        extensions.sort();
        extensions.dedup();
        extensions
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// 一个待翻译文件：输入路径与推导出的输出路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub input: PathBuf,
    pub output: PathBuf,
}
