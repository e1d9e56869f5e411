//! Change signal types shared by event sources and the dispatcher.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of change an event source can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// A file appeared.
    #[serde(rename = "add")]
    Add,
    /// A directory appeared.
    #[serde(rename = "addDir")]
    AddDir,
    /// A file's contents or metadata changed.
    #[serde(rename = "change")]
    Change,
    /// A file was removed.
    #[serde(rename = "unlink")]
    Unlink,
    /// A directory was removed.
    #[serde(rename = "unlinkDir")]
    UnlinkDir,
}

impl ChangeKind {
    /// Every kind, in declaration order.
    pub const ALL: [ChangeKind; 5] = [
        Self::Add,
        Self::AddDir,
        Self::Change,
        Self::Unlink,
        Self::UnlinkDir,
    ];

    /// Event name as reported in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::AddDir => "addDir",
            Self::Change => "change",
            Self::Unlink => "unlink",
            Self::UnlinkDir => "unlinkDir",
        }
    }

    /// Whether this kind refers to a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::AddDir | Self::UnlinkDir)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single change reported by an event source.
///
/// `path` is relative to the working directory when the change happened
/// below it, absolute otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChangeSignal {
    /// What happened.
    pub kind: ChangeKind,
    /// Where it happened.
    pub path: String,
}

impl RawChangeSignal {
    /// Create a new signal.
    pub fn new(kind: ChangeKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}
