//! # fy-translator
//!
//! 中英文文档翻译工具：把实际翻译委托给外部大模型服务，自身负责文件发现、
//! 结构感知的分块、译文重组和输出目录镜像。
//!
//! ## 主要特性
//!
//! - **结构感知分块**: 围栏代码块和块级公式不会被切开
//! - **有界并发**: 同一文件内的块并发翻译，按原顺序重组
//! - **速率限制与重试**: 请求限速，瞬时错误指数退避重试
//! - **逐文件隔离**: 一个文件失败不影响其余文件
//! - **配置灵活**: 支持TOML配置文件和程序化配置
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use fy_translator::{FileSelector, Pipeline, PipelineOptions, TranslationConfig, TranslationService};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TranslationConfig::default();
//!     let tasks = FileSelector::from_config(&config).select(Path::new("docs"))?;
//!
//!     let service = TranslationService::new(config.clone())?;
//!     let pipeline = Pipeline::new(Arc::new(service), PipelineOptions::from_config(&config));
//!     let summary = pipeline.run(&tasks).await;
//!     println!("translated {} files", summary.succeeded.len());
//!     Ok(())
//! }
//! ```
//!
//! ## 配置文件支持
//!
//! ```toml
//! [translation]
//! api_base_url = "https://api.deepseek.com"
//! api_key_env = "DEEPSEEK_API_KEY"
//! model = "deepseek-chat"
//! max_chunk_length = 2000
//! max_concurrent_requests = 3
//! max_requests_per_second = 2.0
//! extensions = ["md", "txt"]
//! include_html = false
//! ```

pub mod chunker;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod selector;
pub mod translator;
pub mod types;

pub use chunker::{split_text, Chunker, FenceState, MathState, RegionTracker};
pub use config::TranslationLibConfig;
pub use error::{Result, TranslationError};
pub use pipeline::{FileReport, Pipeline, PipelineOptions, RunSummary};
pub use selector::FileSelector;
pub use translator::{retry_with_backoff, ChunkTranslator, RateLimiter, TranslationService};
pub use types::{FileTask, RetryConfig, TranslationConfig};
