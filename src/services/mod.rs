pub mod analysis_service;
pub mod progress;
pub mod report_writer;

pub use analysis_service::{DocumentAnalyzer, LlmAnalysisService};
pub use progress::{ProgressSink, TracingProgress};
