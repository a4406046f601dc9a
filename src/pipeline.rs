//! 翻译管线
//!
//! 逐个处理文件任务：读取 → 分块 → 翻译 → 按原顺序拼接 → 写出。
//! 同一文件内的块可以并发翻译，并发数受 `max_concurrent_requests` 限制，
//! 结果总是按块序号重组。一个文件失败只记录下来，不影响后续文件。

use crate::chunker::Chunker;
use crate::error::{Result, TranslationError};
use crate::translator::ChunkTranslator;
use crate::types::{FileTask, TranslationConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

/// 译文块之间的分隔符
pub const CHUNK_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub max_chunk_length: usize,
    /// 同一文件内同时在途的翻译请求上限，至少为 1
    pub max_concurrent_requests: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_chunk_length: 2000,
            max_concurrent_requests: 3,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            max_chunk_length: config.max_chunk_length,
            max_concurrent_requests: config.max_concurrent_requests,
        }
    }
}

/// 单个文件的处理结果
#[derive(Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub chunk_count: usize,
}

/// 整次运行的汇总
#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: Vec<FileReport>,
    pub failed: Vec<(FileTask, TranslationError)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

pub struct Pipeline {
    translator: Arc<dyn ChunkTranslator>,
    chunker: Chunker,
    max_concurrent_requests: usize,
}

impl Pipeline {
    pub fn new(translator: Arc<dyn ChunkTranslator>, options: PipelineOptions) -> Self {
        Self {
            translator,
            chunker: Chunker::new(options.max_chunk_length),
            max_concurrent_requests: options.max_concurrent_requests.max(1),
        }
    }

    /// 翻译一篇文档
    ///
    /// # 参数
    ///
    /// * `path` - 文档来源，仅用于进度输出和错误上下文
    /// * `text` - 文档全文
    ///
    /// # 返回
    ///
    /// 译文（各块以空行连接）和块数。任意一块失败时返回 `ChunkFailed`，
    /// 其余尚未完成的块会被取消。
    pub async fn translate_document(&self, path: &Path, text: &str) -> Result<(String, usize)> {
        let chunks = self.chunker.split(text);
        let total = chunks.len();
        info!("{} 分为 {} 部分", path.display(), total);

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_requests));
        let mut handles = Vec::with_capacity(total);

        for (index, chunk) in chunks.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let translator = self.translator.clone();
            let label = path.display().to_string();

            handles.push(tokio::spawn(async move {
                // 空白块原样保留，不发请求
                if chunk.trim().is_empty() {
                    return Ok::<_, TranslationError>(chunk);
                }

                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| TranslationError::RateLimitError(e.to_string()))?;
                info!("正在翻译 {} 第 {}/{} 部分...", label, index + 1, total);
                let translated = translator.translate(&chunk).await?;
                debug!("完成翻译 {} 第 {}/{} 部分", label, index + 1, total);
                Ok(translated)
            }));
        }

        let mut translated = Vec::with_capacity(total);
        let mut pending = handles.into_iter().enumerate();

        while let Some((index, handle)) = pending.next() {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(TranslationError::Custom(format!("翻译任务异常退出: {}", e))),
            };

            match result {
                Ok(text) => translated.push(text),
                Err(source) => {
                    for (_, rest) in pending {
                        rest.abort();
                    }
                    return Err(TranslationError::ChunkFailed {
                        path: path.to_path_buf(),
                        chunk_index: index,
                        chunk_count: total,
                        source: Box::new(source),
                    });
                }
            }
        }

        Ok((translated.join(CHUNK_SEPARATOR), total))
    }

    /// 处理单个文件任务，必要时创建输出目录
    pub async fn process_file(&self, task: &FileTask) -> Result<FileReport> {
        let text = tokio::fs::read_to_string(&task.input)
            .await
            .map_err(|source| TranslationError::FileRead {
                path: task.input.clone(),
                source,
            })?;

        let (translated, chunk_count) = self.translate_document(&task.input, &text).await?;

        if let Some(parent) = task.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| TranslationError::FileWrite {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&task.output, translated)
            .await
            .map_err(|source| TranslationError::FileWrite {
                path: task.output.clone(),
                source,
            })?;

        Ok(FileReport {
            input: task.input.clone(),
            output: task.output.clone(),
            chunk_count,
        })
    }

    /// 依次处理所有文件，单个文件失败不会中断后续文件
    pub async fn run(&self, tasks: &[FileTask]) -> RunSummary {
        let mut summary = RunSummary::default();
        let total = tasks.len();

        for (i, task) in tasks.iter().enumerate() {
            info!("[{}/{}] 开始翻译: {}", i + 1, total, task.input.display());

            match self.process_file(task).await {
                Ok(report) => {
                    info!(
                        "[{}/{}] 翻译完成，结果已保存到 {}",
                        i + 1,
                        total,
                        report.output.display()
                    );
                    summary.succeeded.push(report);
                }
                Err(e) => {
                    error!("[{}/{}] 跳过 {}: {}", i + 1, total, task.input.display(), e);
                    summary.failed.push((task.clone(), e));
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Bracket {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChunkTranslator for Bracket {
        async fn translate(&self, chunk: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("[{}]", chunk))
        }
    }

    fn pipeline(max_chunk_length: usize) -> (Pipeline, Arc<Bracket>) {
        let translator = Arc::new(Bracket {
            calls: AtomicUsize::new(0),
        });
        let pipeline = Pipeline::new(
            translator.clone(),
            PipelineOptions {
                max_chunk_length,
                max_concurrent_requests: 2,
            },
        );
        (pipeline, translator)
    }

    #[tokio::test]
    async fn test_chunks_joined_with_blank_line() {
        let (pipeline, translator) = pipeline(5);
        let (out, count) = pipeline
            .translate_document(Path::new("doc.md"), "first line\nsecond line")
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(out, "[first line]\n\n[second line]");
        assert_eq!(translator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_document_makes_no_calls() {
        let (pipeline, translator) = pipeline(100);
        let (out, count) = pipeline
            .translate_document(Path::new("empty.md"), "")
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(out, "");
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let (_, translator) = pipeline(10);
        let pipeline = Pipeline::new(
            translator,
            PipelineOptions {
                max_chunk_length: 10,
                max_concurrent_requests: 0,
            },
        );
        assert_eq!(pipeline.max_concurrent_requests, 1);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::default();
        assert!(summary.is_success());
        summary.failed.push((
            FileTask {
                input: PathBuf::from("a.md"),
                output: PathBuf::from("a_fy.md"),
            },
            TranslationError::EmptyResponse,
        ));
        assert!(!summary.is_success());
        assert_eq!(summary.total(), 1);
    }
}
