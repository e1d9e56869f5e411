//! Write-completion and atomic-write settling of raw changes.
//!
//! Changes are recorded as they arrive and released by [`WriteSettler::take_ready`]
//! once they are judged final:
//!
//! - add/change wait until the file size has been stable for the write
//!   threshold, so a large file being copied is reported once
//! - unlink waits for the atomic window; an add of the same path inside the
//!   window turns the pair into a single change
//! - an add that is unlinked before it settles is dropped entirely

use crate::{
    events::ChangeKind,
    platform::{AtomicWrites, WriteFinish},
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone)]
struct Pending {
    kind: ChangeKind,
    seq: u64,
    /// When the current kind was recorded.
    since: Instant,
    /// Last sampled size, `None` until the first sample.
    last_size: Option<Option<u64>>,
    /// When the size was last seen to change.
    stable_since: Instant,
}

impl Pending {
    fn new(kind: ChangeKind, seq: u64, now: Instant) -> Self {
        Self {
            kind,
            seq,
            since: now,
            last_size: None,
            stable_since: now,
        }
    }

    fn reset(&mut self, kind: ChangeKind, now: Instant) {
        self.kind = kind;
        self.since = now;
        self.last_size = None;
        self.stable_since = now;
    }
}

/// Holds raw changes until they are safe to report.
#[derive(Debug)]
pub struct WriteSettler {
    write_finish: Option<WriteFinish>,
    atomic: Option<AtomicWrites>,
    pending: HashMap<PathBuf, Pending>,
    next_seq: u64,
}

impl WriteSettler {
    /// Create a settler. `None` disables the corresponding policy.
    pub fn new(write_finish: Option<WriteFinish>, atomic: Option<AtomicWrites>) -> Self {
        Self {
            write_finish,
            atomic,
            pending: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Record a change observed at `now`.
    pub fn record(&mut self, kind: ChangeKind, path: PathBuf, now: Instant) {
        if self.atomic.is_some() && !kind.is_dir() && is_editor_artifact(&path) {
            return;
        }

        let Some(entry) = self.pending.get_mut(&path) else {
            let seq = self.next_seq;
            self.next_seq += 1;
            self.pending.insert(path, Pending::new(kind, seq, now));
            return;
        };

        use ChangeKind::*;
        match (entry.kind, kind) {
            // Never settled, never reported.
            (Add, Unlink) => {
                self.pending.remove(&path);
            }
            (Unlink, Add) if self.atomic.is_some() => entry.reset(Change, now),
            // Still the first write of a new file.
            (Add, Change) => entry.reset(Add, now),
            (_, kind) => entry.reset(kind, now),
        }
    }

    /// Release every change that is final at `now`, in recording order.
    ///
    /// `size_of` samples a file's current size, `None` when it is gone.
    pub fn take_ready<F>(&mut self, now: Instant, size_of: F) -> Vec<(ChangeKind, PathBuf)>
    where
        F: Fn(&Path) -> Option<u64>,
    {
        let write_finish = self.write_finish;
        let atomic = self.atomic;
        let mut ready = Vec::new();

        self.pending.retain(|path, entry| {
            let release = match entry.kind {
                ChangeKind::Add | ChangeKind::Change => match write_finish {
                    Some(write) => {
                        let size = size_of(path);
                        if entry.last_size != Some(size) {
                            entry.last_size = Some(size);
                            entry.stable_since = now;
                        }
                        if now.duration_since(entry.stable_since) < write.stability_threshold {
                            return true;
                        }
                        // Gone before it settled.
                        if size.is_none() {
                            return false;
                        }
                        true
                    }
                    None => true,
                },
                ChangeKind::Unlink => match atomic {
                    Some(atomic) => now.duration_since(entry.since) >= atomic.window,
                    None => true,
                },
                ChangeKind::AddDir | ChangeKind::UnlinkDir => true,
            };

            if release {
                ready.push((entry.seq, entry.kind, path.clone()));
            }
            !release
        });

        ready.sort_by_key(|(seq, _, _)| *seq);
        ready
            .into_iter()
            .map(|(_, kind, path)| (kind, path))
            .collect()
    }

    /// Whether anything is waiting to be released.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of paths waiting to be released.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Temp files written by editors around a save.
pub fn is_editor_artifact(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.ends_with('~') {
        return true;
    }
    if name.starts_with('.') && (name.ends_with(".swp") || name.ends_with(".swx") || name.ends_with(".swo")) {
        return true;
    }
    name.starts_with(".subl") && name.ends_with(".tmp")
}
