//! Utility modules for the file watching system.

pub mod paths;
pub mod settle;

pub use paths::{lexical_join, report_path, resolve_against, RootAliases};
pub use settle::{is_editor_artifact, WriteSettler};
