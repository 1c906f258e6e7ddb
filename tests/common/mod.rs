//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dtswatch::fs::{DeclarationSource, LocalFs};
use dtswatch::WatchEvent;

pub const ADD: &str = "export declare function add(a: number, b: number): number;\n";
pub const LOAD: &str = "export declare function load(): Promise<void>;\n";

/// Local disk reads, counted per path
#[derive(Default)]
pub struct CountingSource {
    reads: Mutex<HashMap<PathBuf, usize>>,
}

impl CountingSource {
    pub fn reads_of(&self, path: &Path) -> usize {
        self.reads.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

impl DeclarationSource for CountingSource {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        *self.reads.lock().unwrap().entry(path.to_path_buf()).or_default() += 1;
        LocalFs::new().read_to_string(path)
    }
}

/// Wait for the first event matching `pred`, skipping others
pub fn wait_for(
    events: &Receiver<WatchEvent>,
    timeout: Duration,
    pred: impl Fn(&WatchEvent) -> bool,
) -> Option<WatchEvent> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(event) if pred(&event) => return Some(event),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
}

pub fn is_tree_changed(event: &WatchEvent) -> bool {
    matches!(event, WatchEvent::StructureTreeChanged { .. })
}

/// Poll `check` until it holds or `timeout` passes
pub fn eventually(timeout: Duration, check: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    check()
}
