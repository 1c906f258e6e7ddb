//! Published snapshots shared with readers

use std::sync::{Arc, PoisonError, RwLock};

/// Latest published value of `T`.
///
/// The coordinator stores whole `Arc`s; readers clone the current one and
/// never see a value mid-update.
#[derive(Debug)]
pub struct Published<T> {
    slot: Arc<RwLock<Arc<T>>>,
}

impl<T> Clone for Published<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Published<T> {
    pub fn new(value: Arc<T>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(value)),
        }
    }

    pub fn load(&self) -> Arc<T> {
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn store(&self, value: Arc<T>) {
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = value;
    }
}
