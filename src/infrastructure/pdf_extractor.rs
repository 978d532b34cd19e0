//! PDF 文本提取 - 基础设施层
//!
//! 给定一个目录，为其中每个 PDF 产出一条 `ExtractionRecord`。
//! 单个文件失败不会中断整体：记录仍然产出，只是文本为空。

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::FileError;
use crate::models::ExtractionRecord;

/// 判断路径是否为 PDF（按扩展名，不区分大小写）
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// 列出目录下的所有 PDF，按文件名排序
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, FileError> {
    if !dir.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| FileError::read_failed(dir.display().to_string(), e))?;

    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_pdf(path))
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

/// PDF 文本提取器
///
/// 解析在阻塞线程池中执行，解析器 panic 也只影响当前文件。
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 提取目录下所有 PDF 的文本
    pub async fn extract_all(&self, dir: &Path) -> Result<Vec<ExtractionRecord>, FileError> {
        let pdfs = list_pdfs(dir)?;
        info!("📄 开始提取 {} 个 PDF 的文本", pdfs.len());

        let mut records = Vec::with_capacity(pdfs.len());
        for path in pdfs {
            records.push(extract_one(path).await);
        }
        Ok(records)
    }
}

async fn extract_one(path: PathBuf) -> ExtractionRecord {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("[文档 {}] ⚠️ 无法读取文件: {}", filename, e);
            return ExtractionRecord::new(filename, "", 0);
        }
    };

    let joined = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
    })
    .await;

    match joined {
        Ok(Ok(pages)) => {
            let text = join_pages(&pages);
            debug!(
                "[文档 {}] 提取完成: {} 页, {} 字符",
                filename,
                pages.len(),
                text.chars().count()
            );
            ExtractionRecord::new(filename, text, pages.len())
        }
        Ok(Err(e)) => {
            warn!("[文档 {}] ⚠️ PDF 解析失败: {}", filename, e);
            ExtractionRecord::new(filename, "", 0)
        }
        Err(e) => {
            warn!("[文档 {}] ⚠️ PDF 解析线程异常退出: {}", filename, e);
            ExtractionRecord::new(filename, "", 0)
        }
    }
}

/// 去掉每页首尾空白，页与页之间用空行分隔
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
