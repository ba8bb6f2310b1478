//! Tidy Core Library
//!
//! Turns a flat, hash-suffixed markdown export into a folder per `##`
//! section, with hash-free names and every affected link rewritten.
//! Planning is side-effect free; all disk access goes through [`vfs`].
//!

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod reorg;
pub mod utils;
pub mod vfs;

pub use config::TidyConfig;
pub use error::{Result, TidyError};
pub use export::NotionExport;
pub use reorg::{ReorgPlan, RunSummary};
pub use utils::{canonical_name, strip_hash_suffix, unique_filename};
