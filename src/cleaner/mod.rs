pub mod normalizer;
pub mod raw_frame;
pub mod sales_cleaner;

pub use normalizer::FrameNormalizer;
pub use raw_frame::{RAW_COLUMNS, raw_frame_from_str, read_raw_frame};
pub use sales_cleaner::{CleaningFlag, CleaningReport, ExcludedRow, SalesCleaner};
