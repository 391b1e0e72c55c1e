// Public modules
pub mod changelog;
pub mod csv_rewrite;
pub mod defaults;
pub mod error;
pub mod extract;
pub mod git;
pub mod json_format;
pub mod log;
pub mod paths;
pub mod provision;
pub mod restart;
pub mod watermark;

// Internal modules - not part of public API
pub(crate) mod permissions;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
