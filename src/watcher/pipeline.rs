//! Public watch pipeline and the notify glue feeding it

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::config::{load_or_default, Config, CONFIG_FILE_NAME};
use crate::error::{DtsError, DtsResult};
use crate::fs::{DeclarationSource, LocalFs};
use crate::tree::StructureTree;

use super::coordinator::{Command, Coordinator, DetachedRootWatch, RebuildReport, RootWatch, Timing};
use super::event::{WatchEventSink, WatchOptions};
use super::snapshot::Published;

/// Watches a config file and a declaration directory, keeping a structure
/// tree up to date.
///
/// Dropping the watcher stops the coordinator thread.
pub struct DeclarationWatcher {
    commands: Sender<Command>,
    tree: Published<StructureTree>,
    config: Published<Config>,
    worker: Option<JoinHandle<()>>,
    _config_watcher: Option<RecommendedWatcher>,
}

impl DeclarationWatcher {
    /// Watch `base_dir` starting from `config`, with default timing
    pub fn new(
        config: Config,
        base_dir: impl Into<PathBuf>,
        sink: Arc<dyn WatchEventSink>,
    ) -> DtsResult<Self> {
        Self::start(WatchOptions::new(base_dir).with_config(config), sink)
    }

    pub fn start(options: WatchOptions, sink: Arc<dyn WatchEventSink>) -> DtsResult<Self> {
        Self::start_with_source(options, sink, Arc::new(LocalFs::new()))
    }

    /// Start with a custom file source
    ///
    /// The tree starts empty; call [`rebuild_tree`](Self::rebuild_tree) for
    /// the initial scan.
    pub fn start_with_source(
        options: WatchOptions,
        sink: Arc<dyn WatchEventSink>,
        source: Arc<dyn DeclarationSource>,
    ) -> DtsResult<Self> {
        let base_dir = options
            .base_dir
            .canonicalize()
            .unwrap_or_else(|_| options.base_dir.clone());
        let config = match &options.config {
            Some(config) => config.clone(),
            None => load_or_default(&base_dir),
        };

        let (commands, receiver) = mpsc::channel();
        let (root_watch, config_watcher): (Box<dyn RootWatch>, _) = if options.watch_fs {
            (
                Box::new(NotifyRootWatch::new(commands.clone())?),
                Some(watch_config_file(&base_dir, commands.clone())?),
            )
        } else {
            (Box::new(DetachedRootWatch), None)
        };

        let mut coordinator = Coordinator::new(
            base_dir,
            config,
            Timing::from(&options),
            source,
            root_watch,
            sink,
        );
        coordinator.watch_root();

        let tree = coordinator.tree_slot();
        let config = coordinator.config_slot();
        let worker = coordinator.spawn(receiver)?;

        Ok(Self {
            commands,
            tree,
            config,
            worker: Some(worker),
            _config_watcher: config_watcher,
        })
    }

    /// Rescan the declaration directory and wait for the result
    pub fn rebuild_tree(&self) -> DtsResult<RebuildReport> {
        let (reply, result) = mpsc::channel();
        self.send(Command::Rebuild(Some(reply)))?;
        result.recv().map_err(|_| DtsError::WorkerStopped)?
    }

    /// Queue a rescan without waiting for it
    pub fn request_rebuild(&self) -> DtsResult<()> {
        self.send(Command::Rebuild(None))
    }

    /// Latest published tree
    pub fn tree(&self) -> Arc<StructureTree> {
        self.tree.load()
    }

    /// Config currently in effect
    pub fn config(&self) -> Arc<Config> {
        self.config.load()
    }

    /// Handle for reporting file changes by hand
    pub fn handle(&self) -> WatchHandle {
        WatchHandle {
            commands: self.commands.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }

    /// Stop the coordinator and wait for it to exit
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    fn send(&self, command: Command) -> DtsResult<()> {
        self.commands
            .send(command)
            .map_err(|_| DtsError::WorkerStopped)
    }
}

impl Drop for DeclarationWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Producer side of the pipeline.
///
/// Cloneable and usable from any thread; every call returns
/// [`DtsError::WorkerStopped`] once the coordinator is gone.
#[derive(Clone)]
pub struct WatchHandle {
    commands: Sender<Command>,
}

impl WatchHandle {
    pub fn module_created(&self, path: impl Into<PathBuf>) -> DtsResult<()> {
        self.send(Command::ModuleTouched(path.into()))
    }

    pub fn module_changed(&self, path: impl Into<PathBuf>) -> DtsResult<()> {
        self.send(Command::ModuleTouched(path.into()))
    }

    pub fn module_removed(&self, path: impl Into<PathBuf>) -> DtsResult<()> {
        self.send(Command::ModuleRemoved(path.into()))
    }

    pub fn module_renamed(
        &self,
        from: impl Into<PathBuf>,
        to: impl Into<PathBuf>,
    ) -> DtsResult<()> {
        self.send(Command::ModuleRenamed {
            from: from.into(),
            to: to.into(),
        })
    }

    pub fn config_changed(&self) -> DtsResult<()> {
        self.send(Command::ConfigTouched)
    }

    pub fn config_removed(&self) -> DtsResult<()> {
        self.send(Command::ConfigRemoved)
    }

    fn send(&self, command: Command) -> DtsResult<()> {
        self.commands
            .send(command)
            .map_err(|_| DtsError::WorkerStopped)
    }
}

/// Recursive notify watch on the declaration root
struct NotifyRootWatch {
    watcher: RecommendedWatcher,
    root: Option<PathBuf>,
}

impl NotifyRootWatch {
    fn new(commands: Sender<Command>) -> DtsResult<Self> {
        let watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    for command in module_commands(&event) {
                        let _ = commands.send(command);
                    }
                }
                Err(err) => warn!("module watcher error: {err}"),
            },
            NotifyConfig::default(),
        )?;
        Ok(Self {
            watcher,
            root: None,
        })
    }
}

impl RootWatch for NotifyRootWatch {
    fn watch(&mut self, root: &Path) -> DtsResult<()> {
        if let Some(previous) = self.root.take() {
            let _ = self.watcher.unwatch(&previous);
        }
        self.watcher.watch(root, RecursiveMode::Recursive)?;
        debug!(root = %root.display(), "watching declaration root");
        self.root = Some(root.to_path_buf());
        Ok(())
    }
}

fn watch_config_file(base_dir: &Path, commands: Sender<Command>) -> DtsResult<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                for command in config_commands(&event) {
                    let _ = commands.send(command);
                }
            }
            Err(err) => warn!("config watcher error: {err}"),
        },
        NotifyConfig::default(),
    )?;
    watcher.watch(base_dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Translate a raw event below the declaration root.
///
/// Filtering by file type is left to the coordinator, which knows the
/// current tree.
pub(crate) fn module_commands(event: &Event) -> Vec<Command> {
    let touched = || -> Vec<Command> {
        event.paths.iter().cloned().map(Command::ModuleTouched).collect()
    };
    match &event.kind {
        EventKind::Access(_) => Vec::new(),
        EventKind::Remove(_) => event.paths.iter().cloned().map(Command::ModuleRemoved).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => vec![Command::ModuleRenamed {
                from: from.clone(),
                to: to.clone(),
            }],
            _ => touched(),
        },
        // Unpaired rename halves: the drain notices a vanished file.
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any | EventKind::Other => {
            touched()
        }
    }
}

/// Translate a raw event in the base directory into config commands
pub(crate) fn config_commands(event: &Event) -> Vec<Command> {
    let is_config = |path: &PathBuf| path.file_name().is_some_and(|name| name == CONFIG_FILE_NAME);
    let any_config = event.paths.iter().any(is_config);

    match &event.kind {
        EventKind::Access(_) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [_, to] if is_config(to) => vec![Command::ConfigTouched],
            [from, _] if is_config(from) => vec![Command::ConfigRemoved],
            _ => Vec::new(),
        },
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_)
            if any_config =>
        {
            vec![Command::ConfigRemoved]
        }
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any | EventKind::Other
            if any_config =>
        {
            vec![Command::ConfigTouched]
        }
        _ => Vec::new(),
    }
}
