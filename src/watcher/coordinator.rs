//! The coordinator: sole owner of the pipeline state
//!
//! One thread owns the structure tree, the dirty set, the active config and
//! the pending-reload slot. File system callbacks and API calls send
//! [`Command`]s; debounce windows are deadlines the loop sleeps towards.
//! Readers get published `Arc` snapshots and never take a lock on the
//! working state.

use std::any::Any;
use std::io;
use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::config::{from_json_with_warnings, Config, ConfigDiff, CONFIG_FILE_NAME};
use crate::error::{DtsError, DtsResult};
use crate::fs::{DeclarationSource, ReadFailure};
use crate::models::{is_declaration_file, ContentHash, Module};
use crate::scan::{parse_declarations, parse_directory_with_fallback};
use crate::tree::StructureTree;

use super::dirty::DirtySet;
use super::event::{WatchEvent, WatchEventSink, WatchOptions};
use super::snapshot::Published;

/// Requests handled by the coordinator, in arrival order
#[derive(Debug)]
pub(crate) enum Command {
    /// A declaration file (or directory) was created or written
    ModuleTouched(PathBuf),
    /// A file or directory was deleted
    ModuleRemoved(PathBuf),
    ModuleRenamed { from: PathBuf, to: PathBuf },
    ConfigTouched,
    ConfigRemoved,
    /// Full rescan; the reply channel receives the outcome
    Rebuild(Option<Sender<DtsResult<RebuildReport>>>),
    Shutdown,
}

/// Outcome of a full rescan
#[derive(Debug)]
pub struct RebuildReport {
    pub module_count: usize,
    /// Files that could not be (re)parsed; their last good module is kept
    pub failures: Vec<DtsError>,
}

impl RebuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Debounce and retry settings
#[derive(Debug, Clone, Copy)]
pub(crate) struct Timing {
    pub quiescence: Duration,
    pub retry_interval: Duration,
    pub max_read_attempts: Option<u32>,
}

impl From<&WatchOptions> for Timing {
    fn from(options: &WatchOptions) -> Self {
        Self {
            quiescence: options.quiescence,
            retry_interval: options.retry_interval,
            max_read_attempts: options.max_read_attempts,
        }
    }
}

impl Timing {
    fn exhausted(&self, attempts: u32) -> bool {
        self.max_read_attempts.is_some_and(|max| attempts >= max)
    }
}

/// Recursive watch on the declaration root, re-pointed when the root moves
pub(crate) trait RootWatch: Send {
    fn watch(&mut self, root: &Path) -> DtsResult<()>;
}

/// Root watch for pipelines fed by hand
pub(crate) struct DetachedRootWatch;

impl RootWatch for DetachedRootWatch {
    fn watch(&mut self, _root: &Path) -> DtsResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingReload {
    due: Instant,
    attempts: u32,
}

pub(crate) struct Coordinator {
    base_dir: PathBuf,
    config_path: PathBuf,
    root: PathBuf,
    config: Arc<Config>,
    timing: Timing,

    tree: Arc<StructureTree>,
    dirty: DirtySet,
    drain_due: Option<Instant>,
    reload: Option<PendingReload>,
    rescan_due: Option<Instant>,

    source: Arc<dyn DeclarationSource>,
    root_watch: Box<dyn RootWatch>,
    sink: Arc<dyn WatchEventSink>,
    tree_slot: Published<StructureTree>,
    config_slot: Published<Config>,
}

impl Coordinator {
    pub(crate) fn new(
        base_dir: PathBuf,
        config: Config,
        timing: Timing,
        source: Arc<dyn DeclarationSource>,
        root_watch: Box<dyn RootWatch>,
        sink: Arc<dyn WatchEventSink>,
    ) -> Self {
        let config = Arc::new(config);
        let tree = Arc::new(StructureTree::new());
        Self {
            config_path: base_dir.join(CONFIG_FILE_NAME),
            root: resolve_root(&config, &base_dir),
            base_dir,
            tree_slot: Published::new(Arc::clone(&tree)),
            config_slot: Published::new(Arc::clone(&config)),
            config,
            timing,
            tree,
            dirty: DirtySet::new(),
            drain_due: None,
            reload: None,
            rescan_due: None,
            source,
            root_watch,
            sink,
        }
    }

    pub(crate) fn tree_slot(&self) -> Published<StructureTree> {
        self.tree_slot.clone()
    }

    pub(crate) fn config_slot(&self) -> Published<Config> {
        self.config_slot.clone()
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    #[cfg(test)]
    pub(crate) fn tree(&self) -> &Arc<StructureTree> {
        &self.tree
    }

    #[cfg(test)]
    pub(crate) fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    /// Point the root watch at the current declaration root
    pub(crate) fn watch_root(&mut self) {
        if let Err(err) = self.root_watch.watch(&self.root) {
            self.fault(&err);
        }
    }

    /// Apply one command. `Break` means the loop should stop.
    pub(crate) fn handle(&mut self, command: Command, now: Instant) -> ControlFlow<()> {
        match command {
            Command::ModuleTouched(path) => self.touch(path, now),
            Command::ModuleRemoved(path) => self.remove(&path),
            Command::ModuleRenamed { from, to } => self.rename(from, to, now),
            Command::ConfigTouched => {
                if self.reload.is_none() {
                    self.reload = Some(PendingReload {
                        due: now + self.timing.quiescence,
                        attempts: 0,
                    });
                }
            }
            Command::ConfigRemoved => {
                self.reload = None;
                info!("config file removed; using defaults");
                self.apply_config(Config::default(), now);
            }
            Command::Rebuild(reply) => {
                let result = self.rebuild(now);
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            Command::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Run whatever work is due at `now`
    pub(crate) fn poll(&mut self, now: Instant) {
        if self.reload.is_some_and(|pending| pending.due <= now) {
            self.reload_config(now);
        }
        if self.rescan_due.is_some_and(|due| due <= now) {
            let _ = self.rebuild(now);
        }
        if self.drain_due.is_some_and(|due| due <= now) {
            self.drain(now);
        }
    }

    /// Earliest pending deadline, if any work is scheduled
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        [self.reload.map(|pending| pending.due), self.rescan_due, self.drain_due]
            .into_iter()
            .flatten()
            .min()
    }

    pub(crate) fn run(mut self, commands: Receiver<Command>) {
        loop {
            let command = match self.next_deadline() {
                Some(deadline) => {
                    match commands.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                        Ok(command) => Some(command),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match commands.recv() {
                    Ok(command) => Some(command),
                    Err(_) => break,
                },
            };

            if let Some(command) = command {
                if self.handle(command, Instant::now()).is_break() {
                    break;
                }
            }
            self.poll(Instant::now());
        }
        debug!("watch coordinator stopped");
    }

    /// Run on a dedicated thread.
    ///
    /// A panic is reported through the sink as soon as it happens; the
    /// command channel closes with the thread, so later calls see
    /// [`DtsError::WorkerStopped`].
    pub(crate) fn spawn(self, commands: Receiver<Command>) -> io::Result<JoinHandle<()>> {
        let sink = Arc::clone(&self.sink);
        thread::Builder::new()
            .name("dtswatch-coordinator".to_string())
            .spawn(move || {
                if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| self.run(commands))) {
                    let message = format!("watch coordinator panicked: {}", panic_message(&*panic));
                    error!("{message}");
                    sink.on_event(WatchEvent::Error { message });
                }
            })
    }

    // === Module events ===

    fn touch(&mut self, path: PathBuf, now: Instant) {
        if !self.accepts(&path) {
            // A directory appearing or changing under the root can hide any
            // number of declaration files.
            if self.tree.has_under(&path) || (path.starts_with(&self.root) && path.is_dir()) {
                self.request_rescan(now);
            }
            return;
        }
        if self.dirty.insert(path) {
            debug!(dirty = self.dirty.len(), "module marked dirty");
        }
        if self.drain_due.is_none() {
            self.drain_due = Some(now + self.timing.quiescence);
        }
    }

    fn remove(&mut self, path: &Path) {
        self.dirty.remove(path);
        self.dirty.remove_under(path);

        let removed = if self.tree.contains(path) {
            Arc::make_mut(&mut self.tree).remove(path).map_or(0, |_| 1)
        } else if self.tree.has_under(path) {
            Arc::make_mut(&mut self.tree).remove_under(path).len()
        } else {
            0
        };

        if removed > 0 {
            debug!(path = %path.display(), removed, "modules removed");
            self.publish_tree();
        }
    }

    fn rename(&mut self, from: PathBuf, to: PathBuf, now: Instant) {
        if !is_declaration_file(&from) && !is_declaration_file(&to) {
            if self.tree.has_under(&from) || (to.starts_with(&self.root) && to.is_dir()) {
                self.dirty.remove_under(&from);
                self.request_rescan(now);
            }
            return;
        }

        if self.tree.contains(&from) {
            if self.accepts(&to) && !self.tree.contains(&to) {
                let root = self.root.clone();
                if Arc::make_mut(&mut self.tree).rename(&from, &to, &root) {
                    debug!(from = %from.display(), to = %to.display(), "module renamed");
                    self.dirty.rename(&from, to);
                    self.publish_tree();
                    return;
                }
            }
            self.remove(&from);
            self.touch(to, now);
            return;
        }

        self.dirty.remove(&from);
        self.touch(to, now);
    }

    fn request_rescan(&mut self, now: Instant) {
        if self.rescan_due.is_none() {
            debug!("rescan scheduled");
            self.rescan_due = Some(now + self.timing.quiescence);
        }
    }

    /// Is `path` a declaration file this pipeline tracks?
    fn accepts(&self, path: &Path) -> bool {
        is_declaration_file(path)
            && path.strip_prefix(&self.root).is_ok_and(|relative| {
                !relative.components().any(|c| match c {
                    Component::Normal(part) => part.to_string_lossy().starts_with('.'),
                    _ => true,
                })
            })
    }

    // === Dirty-set drain ===

    fn drain(&mut self, now: Instant) {
        self.drain_due = None;
        let mut changed = false;

        for path in self.dirty.paths() {
            match self.source.read_to_string(&path) {
                Ok(content) => {
                    self.dirty.remove(&path);
                    changed |= self.apply_content(&path, &content);
                }
                Err(err) => match ReadFailure::classify(&err) {
                    ReadFailure::Missing => {
                        self.dirty.remove(&path);
                        if self.tree.contains(&path) {
                            Arc::make_mut(&mut self.tree).remove(&path);
                            debug!(path = %path.display(), "module file gone");
                            changed = true;
                        }
                    }
                    ReadFailure::Undecodable => {
                        self.dirty.remove(&path);
                        self.report_failure(&DtsError::ReadFailed {
                            file: path.clone(),
                            source: err,
                        });
                    }
                    ReadFailure::Transient => {
                        let attempts = self.dirty.record_failure(&path);
                        if self.timing.exhausted(attempts) {
                            self.dirty.remove(&path);
                            let err = DtsError::RetriesExhausted {
                                path: path.clone(),
                                attempts,
                            };
                            self.report_failure(&err);
                        } else {
                            debug!(path = %path.display(), attempts, "read failed ({err}); retrying");
                        }
                    }
                },
            }
        }

        if changed {
            self.publish_tree();
        }
        if !self.dirty.is_empty() {
            self.drain_due = Some(now + self.timing.retry_interval);
        }
    }

    /// Parse fresh file content into the tree. Returns `true` if the tree changed.
    fn apply_content(&mut self, path: &Path, content: &str) -> bool {
        let hash = ContentHash::from_content(content);
        if self
            .tree
            .get(path)
            .is_some_and(|module| module.content_hash.as_ref() == Some(&hash))
        {
            debug!(path = %path.display(), "content unchanged");
            return false;
        }

        let functions = match parse_declarations(content, path) {
            Ok(functions) => functions,
            Err(err) => {
                self.report_failure(&err);
                return false;
            }
        };
        debug!(path = %path.display(), functions = functions.len(), "module parsed");

        if self.tree.contains(path) {
            Arc::make_mut(&mut self.tree).replace_functions(path, functions, Some(hash))
        } else {
            match Module::new(path, &self.root) {
                Some(mut module) => {
                    module.functions = functions;
                    module.content_hash = Some(hash);
                    Arc::make_mut(&mut self.tree).insert(module);
                    true
                }
                None => false,
            }
        }
    }

    // === Config ===

    fn reload_config(&mut self, now: Instant) {
        let Some(pending) = self.reload.take() else {
            return;
        };

        match self.source.read_to_string(&self.config_path) {
            Ok(content) => match from_json_with_warnings(&content, &self.config_path) {
                Ok((config, warnings)) => {
                    for warning in &warnings {
                        warn!("{warning}");
                    }
                    self.apply_config(config, now);
                }
                Err(err) => {
                    warn!("{err}; keeping previous config");
                    self.emit(WatchEvent::Error {
                        message: err.to_string(),
                    });
                }
            },
            Err(err) => match ReadFailure::classify(&err) {
                ReadFailure::Missing => {
                    info!("config file missing; using defaults");
                    self.apply_config(Config::default(), now);
                }
                ReadFailure::Undecodable => {
                    let err = DtsError::InvalidConfig {
                        file: self.config_path.clone(),
                        message: err.to_string(),
                    };
                    warn!("{err}; keeping previous config");
                    self.emit(WatchEvent::Error {
                        message: err.to_string(),
                    });
                }
                ReadFailure::Transient => {
                    let attempts = pending.attempts + 1;
                    if self.timing.exhausted(attempts) {
                        self.fault(&DtsError::RetriesExhausted {
                            path: self.config_path.clone(),
                            attempts,
                        });
                    } else {
                        debug!(attempts, "config read failed ({err}); retrying");
                        self.reload = Some(PendingReload {
                            due: now + self.timing.retry_interval,
                            attempts,
                        });
                    }
                }
            },
        }
    }

    fn apply_config(&mut self, config: Config, now: Instant) {
        let diff = ConfigDiff::between(&self.config, &config);
        if diff.is_empty() {
            debug!("config unchanged");
            return;
        }

        self.config = Arc::new(config);
        self.config_slot.store(Arc::clone(&self.config));

        if diff.class_location_changed {
            self.emit(WatchEvent::ClassLocationChanged {
                path: self.config.file_output.class.clone(),
            });
        }
        if diff.interface_location_changed {
            self.emit(WatchEvent::InterfaceLocationChanged {
                path: self.config.file_output.interface.clone(),
            });
        }
        if diff.declaration_path_changed {
            self.root = resolve_root(&self.config, &self.base_dir);
            self.dirty.clear();
            self.drain_due = None;
            info!(root = %self.root.display(), "declaration root moved");
            self.watch_root();
        }

        info!(rebuild = diff.requires_rebuild, "config reloaded");
        self.emit(WatchEvent::ConfigReloaded {
            rebuild: diff.requires_rebuild,
        });
        if diff.requires_rebuild {
            let _ = self.rebuild(now);
        }
    }

    // === Rebuild ===

    fn rebuild(&mut self, now: Instant) -> DtsResult<RebuildReport> {
        self.rescan_due = None;

        let report = match parse_directory_with_fallback(&self.root, self.source.as_ref(), &self.tree)
        {
            Ok(report) => report,
            Err(err) => {
                if matches!(err, DtsError::DirectoryNotFound { .. }) && !self.tree.is_empty() {
                    self.tree = Arc::new(StructureTree::new());
                    self.publish_tree();
                }
                self.fault(&err);
                return Err(err);
            }
        };

        // The scan read every file fresh; only transient failures stay pending.
        self.dirty.clear();
        self.drain_due = None;
        for failure in &report.failures {
            match failure {
                DtsError::ReadFailed { file, source }
                    if ReadFailure::classify(source) == ReadFailure::Transient =>
                {
                    debug!(path = %file.display(), "read failed during rebuild; retrying");
                    self.dirty.insert(file.clone());
                }
                _ => self.report_failure(failure),
            }
        }
        if !self.dirty.is_empty() {
            self.drain_due = Some(now + self.timing.retry_interval);
        }

        let module_count = report.tree.len();
        self.tree = Arc::new(report.tree);
        self.publish_tree();
        info!(
            modules = module_count,
            failures = report.failures.len(),
            "structure tree rebuilt"
        );

        Ok(RebuildReport {
            module_count,
            failures: report.failures,
        })
    }

    // === Output ===

    fn publish_tree(&mut self) {
        self.tree_slot.store(Arc::clone(&self.tree));
        self.emit(WatchEvent::StructureTreeChanged {
            tree: Arc::clone(&self.tree),
        });
    }

    fn report_failure(&self, err: &DtsError) {
        match err.file() {
            Some(file) => {
                warn!("{err}");
                self.emit(WatchEvent::ModuleFailed {
                    path: file.display().to_string(),
                    message: err.to_string(),
                });
            }
            None => self.fault(err),
        }
    }

    fn fault(&self, err: &DtsError) {
        error!("{err}");
        self.emit(WatchEvent::Error {
            message: err.to_string(),
        });
    }

    fn emit(&self, event: WatchEvent) {
        self.sink.on_event(event);
    }
}

fn resolve_root(config: &Config, base_dir: &Path) -> PathBuf {
    let root = config.declaration_root(base_dir);
    root.canonicalize().unwrap_or(root)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
