//! 上传暂存目录 - 基础设施层
//!
//! 一次批处理独占一个临时目录，输入的 PDF 先复制进来再统一提取。
//! 目录随 `UploadStaging` 一起释放，任何退出路径都会清理。

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{info, warn};

use crate::error::FileError;
use crate::infrastructure::pdf_extractor::{is_pdf, list_pdfs};

/// 暂存的上传文件
#[derive(Debug)]
pub struct UploadStaging {
    dir: TempDir,
    files: Vec<PathBuf>,
}

impl UploadStaging {
    /// 把输入文件复制到新的临时目录
    ///
    /// # 参数
    /// - `inputs`: PDF 文件或包含 PDF 的目录
    pub fn stage(inputs: &[PathBuf]) -> Result<Self, FileError> {
        let dir = tempfile::Builder::new()
            .prefix("pdf_uploads_")
            .tempdir()
            .map_err(|e| FileError::copy_failed("<临时目录>", e))?;

        let mut staging = Self {
            dir,
            files: Vec::new(),
        };

        for input in inputs {
            if input.is_dir() {
                for pdf in list_pdfs(input)? {
                    staging.copy_in(&pdf)?;
                }
            } else if input.is_file() {
                if is_pdf(input) {
                    staging.copy_in(input)?;
                } else {
                    warn!("⚠️ 跳过非 PDF 文件: {}", input.display());
                }
            } else {
                return Err(FileError::NotFound {
                    path: input.display().to_string(),
                });
            }
        }

        info!(
            "📁 已暂存 {} 个 PDF 到 {}",
            staging.files.len(),
            staging.dir.path().display()
        );
        Ok(staging)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn staged_files(&self) -> &[PathBuf] {
        &self.files
    }

    fn copy_in(&mut self, source: &Path) -> Result<(), FileError> {
        let target = self.unique_target(source);
        std::fs::copy(source, &target)
            .map_err(|e| FileError::copy_failed(source.display().to_string(), e))?;
        self.files.push(target);
        Ok(())
    }

    /// 同名文件追加 `_1`、`_2` 后缀
    fn unique_target(&self, source: &Path) -> PathBuf {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.pdf".to_string());
        let candidate = self.dir.path().join(&name);
        if !candidate.exists() {
            return candidate;
        }

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let ext = source
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "pdf".to_string());

        (1..)
            .map(|n| self.dir.path().join(format!("{}_{}.{}", stem, n, ext)))
            .find(|path| !path.exists())
            .unwrap_or(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_files_and_directories() {
        let source = tempfile::tempdir().unwrap();
        let nested = source.path().join("more");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(source.path().join("a.pdf"), b"a").unwrap();
        std::fs::write(source.path().join("skip.txt"), b"t").unwrap();
        std::fs::write(nested.join("b.pdf"), b"b").unwrap();

        let staging = UploadStaging::stage(&[
            source.path().join("a.pdf"),
            source.path().join("skip.txt"),
            nested.clone(),
        ])
        .unwrap();

        assert_eq!(staging.file_count(), 2);
        assert_eq!(
            staging.staged_files(),
            &[staging.path().join("a.pdf"), staging.path().join("b.pdf")]
        );
        assert!(staging.staged_files().iter().all(|f| f.exists()));
    }

    #[test]
    fn test_duplicate_names_are_disambiguated() {
        let one = tempfile::tempdir().unwrap();
        let two = tempfile::tempdir().unwrap();
        std::fs::write(one.path().join("paper.pdf"), b"1").unwrap();
        std::fs::write(two.path().join("paper.pdf"), b"2").unwrap();

        let staging =
            UploadStaging::stage(&[one.path().join("paper.pdf"), two.path().join("paper.pdf")])
                .unwrap();

        assert_eq!(staging.file_count(), 2);
        assert!(staging.path().join("paper_1.pdf").exists());
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let err = UploadStaging::stage(&[PathBuf::from("/no/such/file.pdf")]).unwrap_err();
        assert!(matches!(err, FileError::NotFound { .. }));
    }

    #[test]
    fn test_directory_removed_on_drop() {
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("a.pdf"), b"a").unwrap();

        let staging = UploadStaging::stage(&[source.path().to_path_buf()]).unwrap();
        let staged_dir = staging.path().to_path_buf();
        assert!(staged_dir.exists());

        drop(staging);
        assert!(!staged_dir.exists());
    }
}
