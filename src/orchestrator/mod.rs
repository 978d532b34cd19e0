//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用生命周期
//! - 创建分析服务（每个进程一次，显式传递）
//! - 暂存输入、提取文本、展示结果、写入报告
//!
//! ### `batch_processor` - 批量文档分析
//! - 遍历提取记录，逐个调用分析服务
//! - 收集成功和失败，执行综合分析
//!
//! ## 层次关系
//!
//! ```text
//! app (一次运行)
//!     ↓
//! batch_processor (处理 Vec<ExtractionRecord>)
//!     ↓
//! services (能力层：analysis / progress / report)
//!     ↓
//! infrastructure / clients (暂存目录、PDF 提取、LLM 客户端)
//! ```

pub mod app;
pub mod batch_processor;

pub use app::{App, RunSummary};
pub use batch_processor::run_batch;
