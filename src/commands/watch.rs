use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Local;

use dtswatch::watcher::{JsonEventSink, WatchEvent, WatchEventSink, WatchOptions};
use dtswatch::{DeclarationWatcher, DtsError};

pub fn cmd_watch(
    base: &Path,
    quiescence_ms: u64,
    max_attempts: Option<u32>,
    json: bool,
) -> Result<()> {
    let mut options = WatchOptions::new(base).with_quiescence(Duration::from_millis(quiescence_ms));
    if let Some(attempts) = max_attempts {
        options = options.with_max_read_attempts(attempts);
    }

    let sink: Arc<dyn WatchEventSink> = if json {
        Arc::new(JsonEventSink::stdout())
    } else {
        Arc::new(ConsoleEventSink)
    };

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .context("failed to set Ctrl+C handler")?;

    let watcher = DeclarationWatcher::start(options, sink)?;
    if !json {
        println!("Watching {} (Ctrl+C to stop)", base.display());
    }

    // Scan failures were already reported through the sink.
    if let Err(DtsError::WorkerStopped) = watcher.rebuild_tree() {
        bail!("watch pipeline stopped during the initial scan");
    }

    while running.load(Ordering::SeqCst) {
        if !watcher.is_running() {
            bail!("watch pipeline stopped unexpectedly");
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    watcher.shutdown();
    Ok(())
}

/// Human-readable event lines with a local timestamp
struct ConsoleEventSink;

impl WatchEventSink for ConsoleEventSink {
    fn on_event(&self, event: WatchEvent) {
        let timestamp = Local::now().format("%H:%M:%S");
        match event {
            WatchEvent::StructureTreeChanged { tree } => {
                let functions: usize = tree.modules().iter().map(|m| m.functions.len()).sum();
                println!("[{timestamp}] ✓ {} modules, {} functions", tree.len(), functions);
            }
            WatchEvent::ClassLocationChanged { path } => {
                println!("[{timestamp}] class output → {path}");
            }
            WatchEvent::InterfaceLocationChanged { path } => {
                println!("[{timestamp}] interface output → {path}");
            }
            WatchEvent::ConfigReloaded { rebuild } => {
                if rebuild {
                    println!("[{timestamp}] config reloaded, rebuilding");
                } else {
                    println!("[{timestamp}] config reloaded");
                }
            }
            WatchEvent::ModuleFailed { message, .. } => {
                eprintln!("[{timestamp}] ✗ {message}");
            }
            WatchEvent::Error { message } => {
                eprintln!("[{timestamp}] error: {message}");
            }
        }
    }
}
