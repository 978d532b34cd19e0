//! 批量文档分析器 - 编排层
//!
//! ## 职责
//!
//! 1. **逐个分析**：按输入顺序把有文本的记录交给 `DocumentAnalyzer`
//! 2. **失败收集**：单个文档失败记为 `Failure`，继续处理后续文档
//! 3. **并发控制**：`buffered` 限制同时进行的调用数，结果保持输入顺序
//! 4. **综合分析**：只把成功的结论交给综合分析

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{
    AnalysisResult, BatchOutcome, DocumentAnalysis, ExtractionRecord, Findings, Synthesis,
};
use crate::services::{DocumentAnalyzer, ProgressSink};
use crate::utils::logging;

/// 运行一次批处理
///
/// # 参数
/// - `analyzer`: 分析能力（进程内只创建一次）
/// - `progress`: 进度通知
/// - `records`: 提取结果，按输入顺序
/// - `max_concurrent`: 同时分析的文档数，至少为 1
///
/// # 返回
/// 所有记录都没有文本时返回 `AppError::EmptyBatch`，此时不会调用分析器
pub async fn run_batch<A, P>(
    analyzer: &A,
    progress: &P,
    records: &[ExtractionRecord],
    max_concurrent: usize,
) -> AppResult<BatchOutcome>
where
    A: DocumentAnalyzer,
    P: ProgressSink,
{
    let pending: Vec<&ExtractionRecord> = records.iter().filter(|r| !r.is_empty()).collect();
    let skipped = records.len() - pending.len();

    if pending.is_empty() {
        warn!("⚠️ 没有可供分析的文本，批次结束");
        return Err(AppError::EmptyBatch);
    }

    let max_concurrent = max_concurrent.max(1);
    logging::log_batch_start(pending.len(), max_concurrent);

    let analyses: Vec<DocumentAnalysis> = stream::iter(pending)
        .map(|record| analyze_record(analyzer, progress, record))
        .buffered(max_concurrent)
        .collect()
        .await;

    let outcome = BatchOutcome {
        synthesis: synthesize(analyzer, &analyses).await,
        analyses,
    };

    logging::log_batch_complete(outcome.success_count(), outcome.failure_count(), skipped);
    Ok(outcome)
}

async fn analyze_record<A, P>(analyzer: &A, progress: &P, record: &ExtractionRecord) -> DocumentAnalysis
where
    A: DocumentAnalyzer,
    P: ProgressSink,
{
    progress.processing(&record.filename);

    let result = match analyzer.analyze_one(&record.text).await {
        Ok(findings) => {
            info!("[文档 {}] ✓ 分析完成 ({} 项)", record.filename, findings.len());
            AnalysisResult::Success { findings }
        }
        Err(e) => {
            progress.failed(&record.filename, &e.message, e.raw_response.as_deref());
            AnalysisResult::Failure {
                error_message: e.message,
                raw_response: e.raw_response,
            }
        }
    };

    DocumentAnalysis {
        filename: record.filename.clone(),
        result,
    }
}

async fn synthesize<A: DocumentAnalyzer>(analyzer: &A, analyses: &[DocumentAnalysis]) -> Synthesis {
    let successes: Vec<&Findings> = analyses
        .iter()
        .filter_map(|a| a.result.findings())
        .collect();

    if successes.is_empty() {
        warn!("⚠️ 没有成功的分析结果，跳过综合分析");
        return Synthesis::Skipped;
    }

    info!("🧠 正在综合分析 {} 个文档的结论...", successes.len());
    match analyzer.synthesize(&successes).await {
        Ok(result) => Synthesis::Completed(result),
        Err(e) => {
            error!("❌ 综合分析失败: {}", e);
            Synthesis::Failed(e.to_string())
        }
    }
}
