/// 单个 PDF 的文本提取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRecord {
    /// 文件名（同时作为文档标识）
    pub filename: String,
    /// 提取出的全文，提取失败时为空
    pub text: String,
    /// 页数，提取失败时为 0
    pub pages: usize,
}

impl ExtractionRecord {
    pub fn new(filename: impl Into<String>, text: impl Into<String>, pages: usize) -> Self {
        Self {
            filename: filename.into(),
            text: text.into(),
            pages,
        }
    }

    /// 提取失败或空白文档
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
