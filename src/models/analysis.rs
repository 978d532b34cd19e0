use crate::error::ProcessingError;
use crate::models::finding::{FindingValue, Findings};

/// 失败条目在结果表中的列名
pub const ERROR_COLUMN: &str = "error";
pub const RAW_RESPONSE_COLUMN: &str = "raw_response";

/// 单个文档的 AI 分析结果
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Success {
        findings: Findings,
    },
    Failure {
        error_message: String,
        raw_response: Option<String>,
    },
}

/// 单元格内容的借用视图
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellRef<'a> {
    Value(&'a FindingValue),
    Text(&'a str),
}

impl AnalysisResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisResult::Success { .. })
    }

    pub fn findings(&self) -> Option<&Findings> {
        match self {
            AnalysisResult::Success { findings } => Some(findings),
            AnalysisResult::Failure { .. } => None,
        }
    }

    /// 该结果贡献给结果表的列
    pub fn columns(&self) -> Vec<&str> {
        match self {
            AnalysisResult::Success { findings } => findings.keys().collect(),
            AnalysisResult::Failure { raw_response, .. } => {
                let mut columns = vec![ERROR_COLUMN];
                if raw_response.is_some() {
                    columns.push(RAW_RESPONSE_COLUMN);
                }
                columns
            }
        }
    }

    /// 按列名取值，缺失时为 None
    pub fn cell(&self, column: &str) -> Option<CellRef<'_>> {
        match self {
            AnalysisResult::Success { findings } => findings.get(column).map(CellRef::Value),
            AnalysisResult::Failure {
                error_message,
                raw_response,
            } => match column {
                ERROR_COLUMN => Some(CellRef::Text(error_message)),
                RAW_RESPONSE_COLUMN => raw_response.as_deref().map(CellRef::Text),
                _ => None,
            },
        }
    }
}

impl From<Result<Findings, ProcessingError>> for AnalysisResult {
    fn from(result: Result<Findings, ProcessingError>) -> Self {
        match result {
            Ok(findings) => AnalysisResult::Success { findings },
            Err(e) => AnalysisResult::Failure {
                error_message: e.message,
                raw_response: e.raw_response,
            },
        }
    }
}

/// 与文档标识绑定的分析结果
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentAnalysis {
    pub filename: String,
    pub result: AnalysisResult,
}

/// 跨文档综合分析
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    pub analysis: FindingValue,
}

/// 综合分析的执行情况
#[derive(Debug, Clone, PartialEq)]
pub enum Synthesis {
    Completed(SynthesisResult),
    /// 没有成功的单文档结果可供综合
    Skipped,
    Failed(String),
}

/// 一次批处理的输出
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub analyses: Vec<DocumentAnalysis>,
    pub synthesis: Synthesis,
}

impl BatchOutcome {
    pub fn success_count(&self) -> usize {
        self.analyses.iter().filter(|a| a.result.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.analyses.len() - self.success_count()
    }
}
