//! 翻译网关模块
//!
//! 把单个文本块发送给外部大模型服务并取回译文。每次调用对应一次外部请求，
//! 不做缓存也不跨块合并。翻译方向由模型根据内容判断，网关只负责传递固定的指令。

use crate::error::{Result, TranslationError};
use crate::types::{ChatMessage, ChatRequest, ChatResponse, RetryConfig, TranslationConfig};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// 发给模型的固定指令：英文译为中文，以中文为主的内容译为英文，保持格式
pub const TRANSLATION_INSTRUCTION: &str =
    "请将以下英文内容翻译成中文（如果你收到的内容以中文为主，则将其翻译为英文），保持格式不变: \n";

/// 单块翻译的抽象
///
/// 管线只依赖这个 trait，测试中可以替换为内存实现。
#[async_trait]
pub trait ChunkTranslator: Send + Sync {
    /// 翻译一个文本块；失败时返回错误，由调用方决定如何处理
    async fn translate(&self, chunk: &str) -> Result<String>;
}

/// 速率限制器
///
/// 按固定间隔发放请求时间片，多个并发任务共享同一个限制器时总速率不超过配置值。
#[derive(Clone)]
pub struct RateLimiter {
    interval: Option<Duration>,
    next_slot: Arc<Mutex<Instant>>,
}

impl RateLimiter {
    /// 创建新的速率限制器
    ///
    /// # 参数
    ///
    /// * `requests_per_second` - 每秒允许的最大请求数，小于等于 0 表示不限速
    pub fn new(requests_per_second: f64) -> Self {
        let interval = (requests_per_second.is_finite() && requests_per_second > 0.0)
            .then(|| Duration::from_secs_f64(1.0 / requests_per_second));

        Self {
            interval,
            next_slot: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0.0)
    }

    /// 等待下一个可用时间片
    pub async fn acquire(&self) -> Result<()> {
        let Some(interval) = self.interval else {
            return Ok(());
        };

        let wait = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = (*next_slot).max(now);
            *next_slot = slot + interval;
            slot - now
        };

        if !wait.is_zero() {
            sleep(wait).await;
        }
        Ok(())
    }
}

/// 带指数退避的重试机制
///
/// 遇到不可重试的错误立即返回；可重试错误最多重试 `max_retries` 次，
/// 每次等待时间按 `backoff_multiplier` 增长并以 `max_delay_ms` 封顶。
///
/// # 返回
///
/// * `Ok(T)` - 操作成功的结果
/// * `Err(TranslationError)` - 最后一次尝试的错误
pub async fn retry_with_backoff<F, Fut, T>(
    mut operation: F,
    config: &RetryConfig,
    rate_limiter: &RateLimiter,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut delay = config.initial_delay_ms;
    let mut attempt = 0;

    loop {
        rate_limiter.acquire().await?;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt >= config.max_retries || !e.is_retryable() => return Err(e),
            Err(e) => {
                attempt += 1;
                warn!(
                    "Attempt {} failed: {}. Retrying in {}ms...",
                    attempt, e, delay
                );
                sleep(Duration::from_millis(delay)).await;
                delay = std::cmp::min(
                    (delay as f64 * config.backoff_multiplier) as u64,
                    config.max_delay_ms,
                );
            }
        }
    }
}

/// 组装发送给模型的完整用户消息
pub fn build_prompt(chunk: &str) -> String {
    format!("{}{}", TRANSLATION_INSTRUCTION, chunk)
}

/// 从 chat-completions 响应中取出译文，缺失或空白视为空结果
pub fn extract_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(TranslationError::EmptyResponse)
}

/// 基于 OpenAI 兼容接口的翻译服务
///
/// 显式构造后以 `Arc<dyn ChunkTranslator>` 注入管线，整个进程共用一个 HTTP 客户端。
#[derive(Clone)]
pub struct TranslationService {
    client: Client,
    rate_limiter: RateLimiter,
    config: TranslationConfig,
    api_key: String,
    endpoint: String,
}

impl TranslationService {
    /// 按配置解析密钥并创建服务
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        Ok(Self::with_api_key(config, api_key))
    }

    pub fn with_api_key(config: TranslationConfig, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(config.max_concurrent_requests.max(1))
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(concat!("fy-translator/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to create configured client: {}, using default", e);
                Client::new()
            });

        let endpoint = format!(
            "{}/chat/completions",
            config.api_base_url.trim_end_matches('/')
        );

        Self {
            client,
            rate_limiter: RateLimiter::new(config.max_requests_per_second),
            config,
            api_key: api_key.into(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request_once(&self, chunk: &str) -> Result<String> {
        debug!(
            "发送翻译请求到: {}，文本长度: {} 字符",
            self.endpoint,
            chunk.chars().count()
        );

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(build_prompt(chunk)),
            }],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!("翻译服务响应状态: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "无法读取错误信息".to_string());
            return Err(TranslationError::Api {
                code: status.as_u16(),
                message: error_text,
            });
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| TranslationError::Parse(format!("无法解析响应: {}", e)))?;
        extract_content(parsed)
    }
}

#[async_trait]
impl ChunkTranslator for TranslationService {
    async fn translate(&self, chunk: &str) -> Result<String> {
        retry_with_backoff(
            move || self.request_once(chunk),
            &self.config.retry,
            &self.rate_limiter,
        )
        .await
    }
}
