use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 报告写入错误
    #[error("报告错误: {0}")]
    Report(#[from] ReportError),
    /// 所有文档都没有可供分析的文本
    #[error("PDF 中没有找到可供 AI 分析的文本内容")]
    EmptyBatch,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必需的密钥缺失
    #[error("未找到 {name}，请设置环境变量或在 secrets.toml 中添加该项")]
    MissingSecret { name: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    InvalidValue {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// secrets 文件无法读取或解析
    #[error("无法读取密钥文件 {path}: {message}")]
    SecretsFileUnreadable { path: String, message: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
    /// 读取失败
    #[error("读取失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 复制到暂存目录失败
    #[error("复制文件失败 ({path}): {source}")]
    CopyFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 单个文档的 AI 分析失败
///
/// 只在单条记录内传播，由编排层转换为 `AnalysisResult::Failure`，不会中断批次。
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProcessingError {
    pub message: String,
    /// 无法解析时 LLM 的原始响应
    pub raw_response: Option<String>,
}

impl ProcessingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raw_response: None,
        }
    }

    pub fn with_raw_response(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raw_response: Some(raw.into()),
        }
    }
}

/// 报告写入错误
#[derive(Debug, Error)]
pub enum ReportError {
    /// 输出目录不存在
    #[error("输出目录不存在: {}", path.display())]
    DestinationNotFound { path: PathBuf },
    /// 输出路径不是目录
    #[error("输出路径不是目录: {}", path.display())]
    NotADirectory { path: PathBuf },
    /// 工作簿生成失败
    #[error("生成工作簿失败: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
    /// 写入失败
    #[error("写入文件失败 ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }
}

// ========== 便捷构造函数 ==========

impl FileError {
    pub fn read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::ReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn copy_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::CopyFailed {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_secret_message_names_the_key() {
        let err = AppError::from(ConfigError::MissingSecret {
            name: "OPENROUTER_API_KEY".to_string(),
        });
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn test_processing_error_keeps_raw_response() {
        let err = ProcessingError::with_raw_response("JSON 解析失败", "not json");
        assert_eq!(err.to_string(), "JSON 解析失败");
        assert_eq!(err.raw_response.as_deref(), Some("not json"));
        assert!(ProcessingError::new("超时").raw_response.is_none());
    }
}
