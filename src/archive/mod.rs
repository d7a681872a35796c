pub mod extract;

pub use extract::{extract, extract_with, extraction_dir, ExtractError, ExtractedDir};
