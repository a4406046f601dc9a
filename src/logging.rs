//! 日志工具模块
//!
//! 初始化 tracing 输出，并提供运行开始与结束时的汇总输出。

use crate::pipeline::{PipelineOptions, RunSummary};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 初始化日志输出
///
/// 优先使用 `RUST_LOG`；未设置时默认 `info`，`verbose` 为真时为 `debug`。
/// 重复调用是安全的。
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

/// 记录运行参数
pub fn log_run_start(file_count: usize, options: &PipelineOptions) {
    info!("{}", "=".repeat(60));
    info!("找到 {} 个待翻译文件", file_count);
    info!(
        "分块阈值: {} 字符，最大并发请求: {}",
        options.max_chunk_length, options.max_concurrent_requests
    );
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary) {
    info!("{}", "=".repeat(60));
    info!("成功: {}/{}", summary.succeeded.len(), summary.total());
    info!("失败: {}", summary.failed.len());
    for (task, e) in &summary.failed {
        error!("  {}: {}", task.input.display(), e);
    }
    info!("{}", "=".repeat(60));
}
