//! Notify-based event source.

use crate::{
    error::BoxError,
    events::{ChangeKind, RawChangeSignal},
    platform::{IgnoredPredicate, PlatformWatchConfig},
    traits::{EventSource, SignalSender, Subscription},
    utils::{lexical_join, report_path, resolve_against, RootAliases, WriteSettler},
};
use notify::event::{CreateKind, MetadataKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace};
use walkdir::WalkDir;

/// [`EventSource`] backed by notify's native watchers or its poll watcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotifySource;

impl NotifySource {
    /// Create a new notify-based source.
    pub fn new() -> Self {
        Self
    }
}

impl EventSource for NotifySource {
    fn backend_type(&self) -> &'static str {
        "notify"
    }

    fn filters_ignored(&self) -> bool {
        true
    }

    fn subscribe(
        &self,
        config: PlatformWatchConfig,
        sender: SignalSender,
    ) -> Result<Box<dyn Subscription>, BoxError> {
        let runtime = Handle::try_current()?;
        let cwd = resolve_against(&std::env::current_dir()?, &config.cwd)?;
        let mut roots = RootAliases::default();
        for root in &config.roots {
            let canonical = resolve_against(&cwd, root)
                .map_err(|e| format!("Cannot watch {}: {}", root.display(), e))?;
            roots.insert(canonical, lexical_join(&cwd, root));
        }

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        // Without a watcher nothing holds `raw_tx`, so the loop ends after the scan.
        let watcher = if config.persistent {
            Some(start_watcher(&config, &roots, raw_tx)?)
        } else {
            None
        };

        let event_loop = EventLoop {
            settler: WriteSettler::new(config.await_write_finish, config.atomic),
            ignored: config.ignored.clone(),
            ignore_permission_errors: config.ignore_permission_errors,
            roots,
            cwd,
            sender,
        };
        let scan = (!config.ignore_initial).then_some(config.follow_symlinks);
        let root_count = config.roots.len();
        let task = runtime.spawn(event_loop.run(raw_rx, config.settle_interval(), scan));

        info!(
            "Notify watcher started ({} mode, {} roots{})",
            if config.use_polling { "polling" } else { "native" },
            root_count,
            if config.persistent { "" } else { ", initial scan only" }
        );

        Ok(Box::new(NotifySubscription {
            watcher,
            task,
            closed: false,
        }))
    }
}

fn start_watcher(
    config: &PlatformWatchConfig,
    roots: &RootAliases,
    raw_tx: mpsc::UnboundedSender<notify::Result<Event>>,
) -> Result<Box<dyn Watcher + Send>, BoxError> {
    let handler = move |res: notify::Result<Event>| {
        let _ = raw_tx.send(res);
    };

    let notify_config = notify::Config::default().with_follow_symlinks(config.follow_symlinks);
    let mut watcher: Box<dyn Watcher + Send> = if config.use_polling {
        Box::new(PollWatcher::new(
            handler,
            notify_config.with_poll_interval(config.poll_interval),
        )?)
    } else {
        Box::new(RecommendedWatcher::new(handler, notify_config)?)
    };

    for root in roots.canonical() {
        watcher.watch(root, RecursiveMode::Recursive)?;
        debug!("Added notify watch: {}", root.display());
    }
    Ok(watcher)
}

struct NotifySubscription {
    watcher: Option<Box<dyn Watcher + Send>>,
    task: JoinHandle<()>,
    closed: bool,
}

impl Subscription for NotifySubscription {
    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.watcher.take();
            self.task.abort();
            debug!("Notify watcher closed");
        }
    }
}

impl Drop for NotifySubscription {
    fn drop(&mut self) {
        self.close();
    }
}

/// Owns the settler and turns notify events into signals.
struct EventLoop {
    settler: WriteSettler,
    ignored: IgnoredPredicate,
    ignore_permission_errors: bool,
    roots: RootAliases,
    cwd: PathBuf,
    sender: SignalSender,
}

impl EventLoop {
    /// `scan` holds the symlink policy of the initial scan, `None` skips it.
    async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
        interval: Duration,
        scan: Option<bool>,
    ) {
        if let Some(follow_symlinks) = scan {
            self.scan(follow_symlinks);
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Once the raw stream ends, keep ticking until the settler drains.
        let mut events_open = true;
        loop {
            tokio::select! {
                received = events.recv(), if events_open => match received {
                    Some(Ok(event)) => self.record(event),
                    Some(Err(err)) => self.report_error(err),
                    None => events_open = false,
                },
                _ = ticker.tick() => {
                    if !self.flush() || (!events_open && !self.settler.has_pending()) {
                        break;
                    }
                }
            }
        }
        debug!("Notify event loop stopped");
    }

    /// Record everything already below the roots as added.
    fn scan(&mut self, follow_symlinks: bool) {
        let now = Instant::now();
        let roots = self.roots.clone();
        let canonical: Vec<PathBuf> = roots.canonical().map(Path::to_path_buf).collect();
        let ignored = self.ignored.clone();
        let cwd = self.cwd.clone();

        for root in canonical {
            let walker = WalkDir::new(&root)
                .min_depth(1)
                .follow_links(follow_symlinks)
                .into_iter()
                .filter_entry(|entry| {
                    !ignored(&report_path(&roots.to_configured(entry.path()), &cwd))
                });

            for entry in walker {
                match entry {
                    Ok(entry) => {
                        let kind = if entry.file_type().is_dir() {
                            ChangeKind::AddDir
                        } else {
                            ChangeKind::Add
                        };
                        let path = roots.to_configured(entry.path());
                        trace!("Initial {} for {}", kind, report_path(&path, &cwd));
                        self.settler.record(kind, path, now);
                    }
                    Err(err) => self.report_scan_error(err),
                }
            }
        }
        debug!("Initial scan found {} entries", self.settler.pending_count());
    }

    fn record(&mut self, event: Event) {
        let now = Instant::now();
        for (kind, path) in classify(&event) {
            let path = self.roots.to_configured(&path);
            let reported = report_path(&path, &self.cwd);
            if (self.ignored)(&reported) {
                continue;
            }
            trace!("Raw {} event for {}", kind, reported);
            self.settler.record(kind, path, now);
        }
    }

    /// Send settled changes. Returns false once nobody is listening.
    fn flush(&mut self) -> bool {
        if !self.settler.has_pending() {
            return !self.sender.is_closed();
        }
        for (kind, path) in self.settler.take_ready(Instant::now(), file_size) {
            let signal = RawChangeSignal::new(kind, report_path(&path, &self.cwd));
            if self.sender.send(signal).is_err() {
                debug!("Signal receiver dropped");
                return false;
            }
        }
        true
    }

    fn report_error(&self, err: notify::Error) {
        if self.ignore_permission_errors && is_permission_error(&err) {
            trace!("Ignoring permission error: {}", err);
            return;
        }
        error!("Notify error: {}", err);
    }

    fn report_scan_error(&self, err: walkdir::Error) {
        let denied = err
            .io_error()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::PermissionDenied);
        if self.ignore_permission_errors && denied {
            trace!("Ignoring permission error: {}", err);
            return;
        }
        error!("Initial scan error: {}", err);
    }
}

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}

fn is_permission_error(err: &notify::Error) -> bool {
    matches!(
        &err.kind,
        notify::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::PermissionDenied
    )
}

/// Kind for the old side of a rename, judged by what the new side is.
fn vanished(renamed_to: &Path) -> ChangeKind {
    if renamed_to.is_dir() {
        ChangeKind::UnlinkDir
    } else {
        ChangeKind::Unlink
    }
}

fn appeared(path: &Path) -> ChangeKind {
    if path.is_dir() {
        ChangeKind::AddDir
    } else {
        ChangeKind::Add
    }
}

/// Map a notify event onto change kinds, one per affected path.
fn classify(event: &Event) -> Vec<(ChangeKind, PathBuf)> {
    let paths = &event.paths;
    let all = |kind: ChangeKind| paths.iter().map(|p| (kind, p.clone())).collect::<Vec<_>>();

    match &event.kind {
        EventKind::Create(CreateKind::Folder) => all(ChangeKind::AddDir),
        EventKind::Create(CreateKind::File) => all(ChangeKind::Add),
        EventKind::Create(_) => paths.iter().map(|p| (appeared(p), p.clone())).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => vec![
            (vanished(&paths[1]), paths[0].clone()),
            (appeared(&paths[1]), paths[1].clone()),
        ],
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => all(ChangeKind::Unlink),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.iter().map(|p| (appeared(p), p.clone())).collect()
        }
        EventKind::Modify(ModifyKind::Name(_)) => paths
            .iter()
            .map(|p| {
                let kind = if p.exists() { appeared(p) } else { ChangeKind::Unlink };
                (kind, p.clone())
            })
            .collect(),
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => Vec::new(),
        // Directory modifications carry no information for callers.
        EventKind::Modify(_) => paths
            .iter()
            .filter(|p| !p.is_dir())
            .map(|p| (ChangeKind::Change, p.clone()))
            .collect(),
        EventKind::Remove(RemoveKind::Folder) => all(ChangeKind::UnlinkDir),
        EventKind::Remove(_) => all(ChangeKind::Unlink),
        _ => Vec::new(),
    }
}
