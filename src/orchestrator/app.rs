//! 应用生命周期 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：根据配置创建唯一的分析服务
//! 2. **输入暂存**：把 PDF 复制到本次运行独占的临时目录
//! 3. **文本提取**：委托 `PdfTextExtractor`
//! 4. **批量分析**：委托 `batch_processor::run_batch`
//! 5. **结果展示**：输出综合分析和结果预览
//! 6. **报告写入**：委托 `report_writer::assemble`

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{PdfTextExtractor, UploadStaging};
use crate::models::{CellRef, DocumentAnalysis, Synthesis};
use crate::orchestrator::batch_processor;
use crate::services::{report_writer, LlmAnalysisService, TracingProgress};
use crate::utils::{logging, truncate_text};

/// 预览显示的行数
const PREVIEW_ROWS: usize = 5;
/// 预览中每个单元格的最大长度
const PREVIEW_CELL_CHARS: usize = 80;

/// 应用主结构
pub struct App {
    config: Config,
    analyzer: LlmAnalysisService,
    extractor: PdfTextExtractor,
    progress: TracingProgress,
}

/// 一次运行的统计
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub documents: usize,
    pub analyzed: usize,
    pub failed: usize,
    pub report_path: PathBuf,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Self {
        let analyzer = LlmAnalysisService::new(&config);
        let progress = TracingProgress::new(config.verbose_logging);

        Self {
            config,
            analyzer,
            extractor: PdfTextExtractor::new(),
            progress,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<RunSummary> {
        logging::log_startup(
            self.analyzer.model_name(),
            self.config.max_concurrent_analyses,
        );

        // 暂存目录在本函数返回时释放
        let staging = UploadStaging::stage(&self.config.pdf_inputs)?;
        if staging.file_count() == 0 {
            warn!("⚠️ 没有找到待处理的 PDF 文件");
        }

        let records = self.extractor.extract_all(staging.path()).await?;
        let with_text = records.iter().filter(|r| !r.is_empty()).count();
        logging::log_documents_extracted(records.len(), with_text);

        let outcome = batch_processor::run_batch(
            &self.analyzer,
            &self.progress,
            &records,
            self.config.max_concurrent_analyses,
        )
        .await?;

        println!("{}", render_synthesis(&outcome.synthesis));
        println!("{}", render_preview(&outcome.analyses, PREVIEW_ROWS));

        let report_path =
            report_writer::assemble(&records, &outcome.analyses, &self.config.output_dir)?;
        info!("✅ 文件处理成功！已保存至: {}", report_path.display());

        let summary = RunSummary {
            documents: records.len(),
            analyzed: outcome.success_count(),
            failed: outcome.failure_count(),
            report_path,
        };
        logging::print_final_stats(summary.analyzed, summary.documents, &summary.report_path);

        Ok(summary)
    }
}

/// 综合分析的 Markdown 展示
pub fn render_synthesis(synthesis: &Synthesis) -> String {
    let body = match synthesis {
        Synthesis::Completed(result) => result.analysis.render_markdown(),
        Synthesis::Skipped => "没有成功的分析结果，未进行综合分析。\n".to_string(),
        Synthesis::Failed(reason) => format!("综合分析失败: {}\n", reason),
    };
    format!("### Research Analysis\n\n{}", body)
}

/// AI 结果的前几行预览
pub fn render_preview(analyses: &[DocumentAnalysis], max_rows: usize) -> String {
    let columns = report_writer::ai_columns(analyses);
    let mut out = String::from("### Preview of AI Analysis\n\n");

    for analysis in analyses.iter().take(max_rows) {
        out.push_str(&format!("- {}\n", analysis.filename));
        for column in columns.iter().skip(1) {
            let cell = match report_writer::ai_cell(analysis, column) {
                Some(CellRef::Text(text)) => text.to_string(),
                Some(CellRef::Value(value)) => value.render_inline(),
                None => continue,
            };
            if cell.is_empty() {
                continue;
            }
            out.push_str(&format!(
                "    {}: {}\n",
                column,
                truncate_text(&cell.replace('\n', " "), PREVIEW_CELL_CHARS)
            ));
        }
    }

    if analyses.len() > max_rows {
        out.push_str(&format!("... 另有 {} 行\n", analyses.len() - max_rows));
    }
    out
}
