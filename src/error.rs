//! 错误处理模块
//!
//! 定义翻译流程中使用的错误类型，以及重试与隔离策略所依赖的错误分类。

use std::path::PathBuf;
use thiserror::Error;

/// 翻译错误类型
///
/// # 变体说明
///
/// * `PathNotFound` / `NoMatchingFiles` - 整次运行级别的错误，不触碰任何文件
/// * `FileRead` / `FileWrite` - 单个文件的读写失败
/// * `Http` / `Api` / `EmptyResponse` / `Parse` - 外部翻译服务调用失败
/// * `ChunkFailed` - 某个文件的某一块翻译失败，带有足以续跑的上下文
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("路径不存在: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("没有需要翻译的文件: {}", .0.display())]
    NoMatchingFiles(PathBuf),

    #[error("读取文件失败 {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("写入文件失败 {}: {source}", .path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP请求错误
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API响应错误
    #[error("API error {code}: {message}")]
    Api { code: u16, message: String },

    #[error("翻译服务返回了空结果")]
    EmptyResponse,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limit error: {0}")]
    RateLimitError(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error(
        "翻译失败 {} (第 {}/{} 块): {source}",
        .path.display(),
        .chunk_index + 1,
        .chunk_count
    )]
    ChunkFailed {
        path: PathBuf,
        /// 从 0 开始的块序号
        chunk_index: usize,
        chunk_count: usize,
        #[source]
        source: Box<TranslationError>,
    },

    #[error("{0}")]
    Custom(String),
}

impl TranslationError {
    /// 是否值得重试：网络错误、限流、服务端错误和空结果
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Http(e) => !e.is_builder() && !e.is_decode(),
            TranslationError::Api { code, .. } => *code == 408 || *code == 429 || *code >= 500,
            TranslationError::EmptyResponse => true,
            TranslationError::RateLimitError(_) => true,
            _ => false,
        }
    }

    /// 是否终止整次运行（其余错误只影响当前文件）
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            TranslationError::PathNotFound(_) | TranslationError::NoMatchingFiles(_)
        )
    }
}

/// 翻译结果类型别名
pub type Result<T> = std::result::Result<T, TranslationError>;
