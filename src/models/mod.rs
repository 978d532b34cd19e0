pub mod analysis;
pub mod finding;
pub mod record;

pub use analysis::{
    AnalysisResult, BatchOutcome, CellRef, DocumentAnalysis, Synthesis, SynthesisResult,
};
pub use finding::{FindingValue, Findings};
pub use record::ExtractionRecord;
