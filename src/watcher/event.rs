//! Watch event types, sinks and options

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::Config;
use crate::tree::StructureTree;

/// Quiescence window before acting on a change, in milliseconds
pub const QUIESCENCE_MS: u64 = 500;

/// Delay between retries of a failed read, in milliseconds
pub const RETRY_INTERVAL_MS: u64 = 1000;

/// Watch options
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Directory holding the config file; the declaration path is relative to it
    pub base_dir: PathBuf,
    /// Initial config; `None` loads it from `base_dir`
    pub config: Option<Config>,
    /// Wait after the first change of a burst
    pub quiescence: Duration,
    /// Wait between passes while reads keep failing
    pub retry_interval: Duration,
    /// Give up on a file after this many failed reads (`None` retries forever)
    pub max_read_attempts: Option<u32>,
    /// Register file system watchers (off for pipelines driven by hand)
    pub watch_fs: bool,
}

impl WatchOptions {
    /// Create new watch options with default timing
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            config: None,
            quiescence: Duration::from_millis(QUIESCENCE_MS),
            retry_interval: Duration::from_millis(RETRY_INTERVAL_MS),
            max_read_attempts: None,
            watch_fs: true,
        }
    }

    /// Set the initial config
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_quiescence(mut self, quiescence: Duration) -> Self {
        self.quiescence = quiescence;
        self
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Bound the number of read attempts per file
    pub fn with_max_read_attempts(mut self, attempts: u32) -> Self {
        self.max_read_attempts = Some(attempts);
        self
    }

    /// Set whether OS file watchers are registered
    pub fn with_watch_fs(mut self, watch_fs: bool) -> Self {
        self.watch_fs = watch_fs;
        self
    }
}

/// Watch event types for NDJSON output
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WatchEvent {
    /// Output location of the generated class changed
    ClassLocationChanged { path: String },
    /// Output location of the generated interface changed
    InterfaceLocationChanged { path: String },
    /// A new structure tree was published
    StructureTreeChanged { tree: Arc<StructureTree> },
    /// A new config is in effect
    ConfigReloaded { rebuild: bool },
    /// A declaration file could not be turned into a module
    ModuleFailed { path: String, message: String },
    /// Error occurred
    Error { message: String },
}

impl WatchEvent {
    /// Convert to JSON string with "command": "watch" field included
    pub fn to_json(&self) -> String {
        let mut value =
            serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({"event": "error"}));
        if let Some(obj) = value.as_object_mut() {
            obj.insert("command".to_string(), serde_json::json!("watch"));
        }
        serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Trait for receiving watch events
///
/// Called from the coordinator thread; implementations should not block.
pub trait WatchEventSink: Send + Sync {
    fn on_event(&self, event: WatchEvent);
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl WatchEventSink for NoopEventSink {
    fn on_event(&self, _event: WatchEvent) {}
}

/// Event sink that writes NDJSON lines
pub struct JsonEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Create a JSON event sink writing to a custom writer
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }
}

impl WatchEventSink for JsonEventSink {
    fn on_event(&self, event: WatchEvent) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event.to_json());
            let _ = writer.flush();
        }
    }
}

/// Event sink forwarding every event into a channel
pub struct ChannelEventSink {
    sender: Mutex<Sender<WatchEvent>>,
}

impl ChannelEventSink {
    pub fn new(sender: Sender<WatchEvent>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }
}

impl WatchEventSink for ChannelEventSink {
    fn on_event(&self, event: WatchEvent) {
        if let Ok(sender) = self.sender.lock() {
            // The receiver going away just means nobody is listening any more.
            let _ = sender.send(event);
        }
    }
}
