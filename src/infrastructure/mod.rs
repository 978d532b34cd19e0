pub mod pdf_extractor;
pub mod upload_staging;

pub use pdf_extractor::PdfTextExtractor;
pub use upload_staging::UploadStaging;
