//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// 默认级别为 info，可通过 `RUST_LOG` 覆盖。重复调用不会报错。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `model`: 使用的模型名称
/// - `max_concurrent`: 最大并发数
pub fn log_startup(model: &str, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("📚 AI PDF 提取器启动");
    info!("🤖 模型: {}", model);
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录提取完成信息
///
/// # 参数
/// - `total`: 文档总数
/// - `with_text`: 含有文本的文档数
pub fn log_documents_extracted(total: usize, with_text: usize) {
    info!("✓ 共提取 {} 个 PDF，其中 {} 个含有文本", total, with_text);
    if with_text < total {
        info!("💡 {} 个文档没有文本，将跳过 AI 分析", total - with_text);
    }
}

/// 记录批次开始信息
///
/// # 参数
/// - `pending`: 待分析的文档数
/// - `max_concurrent`: 最大并发数
pub fn log_batch_start(pending: usize, max_concurrent: usize) {
    info!("\n{}", "=".repeat(60));
    info!("🤖 开始 AI 分析: {} 个文档 (并发 {})", pending, max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `skipped`: 跳过数量（无文本）
pub fn log_batch_complete(success: usize, failed: usize, skipped: usize) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ AI 分析完成: 成功 {}, 失败 {}, 跳过 {}",
        success, failed, skipped
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `total`: 文档总数
/// - `report_path`: 报告保存路径
pub fn print_final_stats(success: usize, total: usize, report_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 分析成功: {}/{}", success, total);
    info!("💾 文件已保存至: {}", report_path.display());
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
