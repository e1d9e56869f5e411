//! Command-line front end for `coursebook-watch`.

pub mod cli;
pub mod config;
