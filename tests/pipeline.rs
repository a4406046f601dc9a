use async_trait::async_trait;
use fy_translator::{
    ChunkTranslator, FileSelector, Pipeline, PipelineOptions, Result, TranslationError,
};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "fy-pipeline-{}-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::SeqCst),
        name
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// 把文本转为大写
struct Uppercase;

#[async_trait]
impl ChunkTranslator for Uppercase {
    async fn translate(&self, chunk: &str) -> Result<String> {
        Ok(chunk.to_uppercase())
    }
}

/// 含有 FAIL 的块返回错误
struct FailOnMarker;

#[async_trait]
impl ChunkTranslator for FailOnMarker {
    async fn translate(&self, chunk: &str) -> Result<String> {
        if chunk.contains("FAIL") {
            Err(TranslationError::Api {
                code: 500,
                message: "upstream exploded".to_string(),
            })
        } else {
            Ok(chunk.to_uppercase())
        }
    }
}

/// 越靠前的块返回越慢，并记录同时在途的最大请求数
struct SlowFirst {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl ChunkTranslator for SlowFirst {
    async fn translate(&self, chunk: &str) -> Result<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let index: u64 = chunk.trim_start_matches("line").parse().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(60u64.saturating_sub(index * 10))).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("<{}>", chunk))
    }
}

fn options(max_chunk_length: usize, max_concurrent_requests: usize) -> PipelineOptions {
    PipelineOptions {
        max_chunk_length,
        max_concurrent_requests,
    }
}

#[tokio::test]
async fn test_directory_run_mirrors_tree() {
    let root = scratch_dir("mirror");
    let docs = root.join("docs");
    fs::create_dir_all(docs.join("guide")).unwrap();
    fs::write(docs.join("a.md"), "# title\nhello").unwrap();
    fs::write(docs.join("guide/b.txt"), "plain text").unwrap();
    fs::write(docs.join("logo.png"), [0u8, 1]).unwrap();

    let tasks = FileSelector::new(["md", "txt"], "_fy").select(&docs).unwrap();
    assert_eq!(tasks.len(), 2);

    let pipeline = Pipeline::new(Arc::new(Uppercase), options(2000, 2));
    let summary = pipeline.run(&tasks).await;

    assert!(summary.is_success());
    assert_eq!(summary.succeeded.len(), 2);

    let out = root.join("docs_fy");
    assert_eq!(fs::read_to_string(out.join("a.md")).unwrap(), "# TITLE\nHELLO");
    assert_eq!(fs::read_to_string(out.join("guide/b.txt")).unwrap(), "PLAIN TEXT");
    assert!(!out.join("logo.png").exists());
}

#[tokio::test]
async fn test_single_file_written_next_to_input() {
    let root = scratch_dir("single");
    let input = root.join("report.md");
    fs::write(&input, "para1\n```\ncode line 1\ncode line 2\n```\npara2").unwrap();

    let tasks = FileSelector::new(["md", "txt"], "_fy").select(&input).unwrap();
    let pipeline = Pipeline::new(Arc::new(Uppercase), options(5, 1));
    let summary = pipeline.run(&tasks).await;

    assert!(summary.is_success());
    assert_eq!(summary.succeeded[0].chunk_count, 1);
    assert_eq!(
        fs::read_to_string(root.join("report_fy.md")).unwrap(),
        "PARA1\n```\nCODE LINE 1\nCODE LINE 2\n```\nPARA2"
    );
}

#[tokio::test]
async fn test_failed_file_does_not_stop_the_run() {
    let root = scratch_dir("isolation");
    let docs = root.join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("1-good.md"), "fine").unwrap();
    fs::write(docs.join("2-bad.md"), "first part ok\nthis one will FAIL").unwrap();
    fs::write(docs.join("3-good.md"), "also fine").unwrap();

    let tasks = FileSelector::new(["md"], "_fy").select(&docs).unwrap();
    let pipeline = Pipeline::new(Arc::new(FailOnMarker), options(5, 2));
    let summary = pipeline.run(&tasks).await;

    assert!(!summary.is_success());
    assert_eq!(summary.succeeded.len(), 2);
    assert_eq!(summary.failed.len(), 1);

    let (task, err) = &summary.failed[0];
    assert!(task.input.ends_with("2-bad.md"));
    match err {
        TranslationError::ChunkFailed {
            chunk_index,
            chunk_count,
            ..
        } => {
            assert_eq!(*chunk_index, 1);
            assert_eq!(*chunk_count, 2);
        }
        other => panic!("unexpected error: {}", other),
    }

    let out = root.join("docs_fy");
    assert!(out.join("1-good.md").exists());
    assert!(!out.join("2-bad.md").exists());
    assert_eq!(fs::read_to_string(out.join("3-good.md")).unwrap(), "ALSO FINE");
}

#[tokio::test]
async fn test_unreadable_file_is_reported_and_skipped() {
    let root = scratch_dir("unreadable");
    let docs = root.join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("a.md"), "alpha").unwrap();
    fs::write(docs.join("b.md"), [0xffu8, 0xfe, 0x00]).unwrap();
    fs::write(docs.join("c.md"), "gamma").unwrap();

    let tasks = FileSelector::new(["md"], "_fy").select(&docs).unwrap();
    fs::remove_file(docs.join("c.md")).unwrap();

    let pipeline = Pipeline::new(Arc::new(Uppercase), options(100, 1));
    let summary = pipeline.run(&tasks).await;

    assert_eq!(summary.succeeded.len(), 1);
    assert_eq!(summary.failed.len(), 2);
    assert!(summary
        .failed
        .iter()
        .all(|(_, e)| matches!(e, TranslationError::FileRead { .. })));
}

#[tokio::test]
async fn test_out_of_order_completion_is_reassembled_in_order() {
    let translator = Arc::new(SlowFirst {
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let pipeline = Pipeline::new(translator.clone(), options(1, 3));

    let text = (0..6).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n");
    let (out, count) = pipeline
        .translate_document(&PathBuf::from("ordered.md"), &text)
        .await
        .unwrap();

    assert_eq!(count, 6);
    assert_eq!(
        out,
        "<line0>\n\n<line1>\n\n<line2>\n\n<line3>\n\n<line4>\n\n<line5>"
    );
    let peak = translator.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "at most three requests in flight, saw {}", peak);
    assert!(peak >= 2, "chunks should overlap, saw {}", peak);
}

#[tokio::test]
async fn test_blank_chunks_pass_through() {
    let pipeline = Pipeline::new(Arc::new(FailOnMarker), options(3, 1));
    // trailing blank line becomes its own chunk after the flush
    let (out, count) = pipeline
        .translate_document(&PathBuf::from("blank.md"), "abcd\n")
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(out, "ABCD\n\n");
}
