//! # PDF Extract AI
//!
//! 批量提取 PDF 文本，调用 LLM 逐篇分析并综合结论，最终输出两张工作表的 Excel 报告
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有本地资源，只暴露能力
//! - `UploadStaging` - 本次运行独占的暂存目录，释放时自动删除
//! - `PdfTextExtractor` - 逐页提取 PDF 文本，失败的文件记为空文本
//!
//! ### ② 客户端（Clients）
//! - `LlmClient` - OpenAI 兼容的聊天补全接口（默认 OpenRouter）
//!
//! ### ③ 业务能力层（Services）
//! - `DocumentAnalyzer` / `LlmAnalysisService` - 单篇分析与跨文档综合分析
//! - `ProgressSink` - 进度通知
//! - `report_writer` - 写出 "Raw Data" 与 "AI Analysis" 两张工作表
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量分析，收集成功与失败
//! - `orchestrator/app` - 一次完整运行：暂存 → 提取 → 分析 → 展示 → 写报告

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, ProcessingError};
pub use infrastructure::{PdfTextExtractor, UploadStaging};
pub use models::{AnalysisResult, BatchOutcome, DocumentAnalysis, ExtractionRecord, Findings};
pub use orchestrator::{run_batch, App, RunSummary};
pub use services::{DocumentAnalyzer, LlmAnalysisService};
