pub mod file_filter;
pub mod tree_scanner;

pub use file_filter::SuffixFilter;
pub use tree_scanner::{validate_root, CandidateFile, CandidateFiles, TreeScanner};
