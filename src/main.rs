use clap::Parser;
use fy_translator::logging::{init_tracing, log_run_start, print_final_stats};
use fy_translator::{
    FileSelector, Pipeline, PipelineOptions, TranslationLibConfig, TranslationService,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 中英文文档翻译：Markdown / 纯文本 / HTML，单个文件或整个目录
#[derive(Debug, Parser)]
#[command(name = "fy", version, about)]
struct Cli {
    /// 要翻译的文件或目录；省略时交互式输入
    path: Option<String>,

    /// 配置文件路径（默认依次查找 fy-config.toml 等）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 同时翻译 .html 文件
    #[arg(long)]
    html: bool,

    /// 分块阈值（字符）
    #[arg(long)]
    max_length: Option<usize>,

    /// 同一文件内最大并发请求数
    #[arg(long)]
    concurrency: Option<usize>,

    /// 生成示例配置文件后退出
    #[arg(long, value_name = "FILE")]
    init_config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

/// 去掉首尾空白和成对或单侧的引号（拖拽路径时常见）
fn clean_path_input(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim()
        .to_string()
}

fn prompt_for_path() -> io::Result<String> {
    print!("请输入要翻译的文件或目录: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(path) = &cli.init_config {
        return match TranslationLibConfig::generate_example_config(path) {
            Ok(()) => {
                info!("示例配置已写入 {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    let lib_config = match &cli.config {
        Some(path) => match TranslationLibConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("加载配置失败: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => TranslationLibConfig::load_from_default_locations(),
    };

    let mut config = lib_config.translation;
    config.include_html |= cli.html;
    if let Some(max_length) = cli.max_length {
        config.max_chunk_length = max_length;
    }
    if let Some(concurrency) = cli.concurrency {
        config.max_concurrent_requests = concurrency;
    }

    let raw_path = match cli.path {
        Some(path) => path,
        None => match prompt_for_path() {
            Ok(line) => line,
            Err(e) => {
                error!("读取输入失败: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };
    let input = PathBuf::from(clean_path_input(&raw_path));

    let tasks = match FileSelector::from_config(&config).select(&input) {
        Ok(tasks) => tasks,
        Err(e) if e.is_fatal_for_run() => {
            warn!("{}，允许的扩展名: {:?}", e, config.allowed_extensions());
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let service = match TranslationService::new(config.clone()) {
        Ok(service) => service,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = PipelineOptions::from_config(&config);
    log_run_start(tasks.len(), &options);

    let pipeline = Pipeline::new(Arc::new(service), options);
    let summary = pipeline.run(&tasks).await;
    print_final_stats(&summary);

    if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path_input_strips_quotes() {
        assert_eq!(clean_path_input("  \"C:\\docs\\a.md\"\n"), "C:\\docs\\a.md");
        assert_eq!(clean_path_input("'notes dir'"), "notes dir");
        assert_eq!(clean_path_input("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from(["fy", "docs", "--html", "--max-length", "500", "--concurrency", "4"]);
        assert_eq!(cli.path.as_deref(), Some("docs"));
        assert!(cli.html);
        assert_eq!(cli.max_length, Some(500));
        assert_eq!(cli.concurrency, Some(4));
        assert!(!cli.verbose);
    }
}
