//! Watch/update pipeline
//!
//! Two notify watchers (the config file and the declaration directory)
//! feed one coordinator thread. Bursts of changes are debounced into a
//! dirty set, drained after a quiescence window, and every change to the
//! structure tree is published as a snapshot and a [`WatchEvent`].

mod coordinator;
mod dirty;
mod event;
mod pipeline;
mod snapshot;

pub use coordinator::RebuildReport;
pub use event::{
    ChannelEventSink, JsonEventSink, NoopEventSink, WatchEvent, WatchEventSink, WatchOptions,
    QUIESCENCE_MS, RETRY_INTERVAL_MS,
};
pub use pipeline::{DeclarationWatcher, WatchHandle};
