//! 文件选择模块
//!
//! 把用户给出的文件或目录路径解析为有序的 [`FileTask`] 列表，并按固定规则推导输出路径：
//! 文件 `name.ext` → 同目录下的 `name_fy.ext`；目录 `dirname` → 同级目录 `dirname_fy`，
//! 保留匹配文件的相对子路径。

use crate::error::{Result, TranslationError};
use crate::types::{FileTask, TranslationConfig};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct FileSelector {
    /// 小写、不带点的扩展名
    extensions: Vec<String>,
    suffix: String,
}

impl FileSelector {
    pub fn new<I, S>(extensions: I, suffix: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            suffix: suffix.into(),
        }
    }

    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(config.allowed_extensions(), config.output_suffix.clone())
    }

    /// 扩展名是否在白名单中（不区分大小写）
    pub fn is_allowed(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }

    /// 解析输入路径
    ///
    /// # 返回
    ///
    /// * `Ok(Vec<FileTask>)` - 至少一个任务；目录模式下按相对路径字典序排列
    /// * `Err(PathNotFound)` - 路径不存在
    /// * `Err(NoMatchingFiles)` - 单个文件不在白名单，或目录中没有匹配文件
    pub fn select(&self, path: &Path) -> Result<Vec<FileTask>> {
        if !path.exists() {
            return Err(TranslationError::PathNotFound(path.to_path_buf()));
        }

        if path.is_dir() {
            return self.select_directory(path);
        }

        if !self.is_allowed(path) {
            return Err(TranslationError::NoMatchingFiles(path.to_path_buf()));
        }

        Ok(vec![FileTask {
            input: path.to_path_buf(),
            output: suffixed_file_path(path, &self.suffix),
        }])
    }

    fn select_directory(&self, dir: &Path) -> Result<Vec<FileTask>> {
        let output_root = suffixed_dir_path(dir, &self.suffix);
        let mut matched: Vec<(PathBuf, PathBuf)> = Vec::new();

        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("跳过无法访问的目录项: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.is_allowed(entry.path()) {
                continue;
            }

            let relative = match entry.path().strip_prefix(dir) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => continue,
            };
            matched.push((relative, entry.path().to_path_buf()));
        }

        if matched.is_empty() {
            return Err(TranslationError::NoMatchingFiles(dir.to_path_buf()));
        }

        matched.sort_by(|a, b| a.0.cmp(&b.0));
        debug!("在 {} 中找到 {} 个文件", dir.display(), matched.len());

        Ok(matched
            .into_iter()
            .map(|(relative, input)| FileTask {
                output: output_root.join(relative),
                input,
            })
            .collect())
    }
}

/// `dir/name.ext` → `dir/name{suffix}.ext`
pub fn suffixed_file_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().map(OsString::from).unwrap_or_default();
    let mut name = stem;
    name.push(suffix);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

/// `parent/dirname` → `parent/dirname{suffix}`
pub fn suffixed_dir_path(dir: &Path, suffix: &str) -> PathBuf {
    // "." 或 ".." 之类的路径没有文件名，先规范化
    let dir = match dir.file_name() {
        Some(_) => dir.to_path_buf(),
        None => dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf()),
    };

    let mut name = dir.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    match dir.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}
