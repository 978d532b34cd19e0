//! 进度通知 - 业务能力层
//!
//! 只负责"告诉使用者正在发生什么"，不影响处理结果

use tracing::{error, info};

use crate::utils::truncate_text;

/// 原始响应在非详细模式下的预览长度
const RAW_PREVIEW_CHARS: usize = 500;

/// 进度通知接口
pub trait ProgressSink {
    /// 开始处理某个文档
    fn processing(&self, filename: &str);

    /// 某个文档分析失败
    fn failed(&self, filename: &str, error: &str, raw_response: Option<&str>);
}

/// 基于 tracing 的进度输出
#[derive(Debug, Clone, Default)]
pub struct TracingProgress {
    verbose: bool,
}

impl TracingProgress {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressSink for TracingProgress {
    fn processing(&self, filename: &str) {
        info!("[文档 {}] 🔍 正在分析...", filename);
    }

    fn failed(&self, filename: &str, error: &str, raw_response: Option<&str>) {
        error!("[文档 {}] ❌ 分析失败: {}", filename, error);
        if let Some(raw) = raw_response {
            let shown = if self.verbose {
                raw.to_string()
            } else {
                truncate_text(raw, RAW_PREVIEW_CHARS)
            };
            error!("[文档 {}] 原始响应:\n{}", filename, shown);
        }
    }
}
