use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An owned reference to bytes held by a [`HandleStore`].
///
/// Handles cannot be cloned, and [`HandleStore::release`] consumes them, so a handle is released
/// at most once.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ByteHandle(u64);

#[derive(Default)]
pub struct HandleStore {
    next_id: u64,
    live: HashMap<u64, Arc<[u8]>>,
    released: u64,
}

impl HandleStore {
    pub fn register(&mut self, bytes: Arc<[u8]>) -> ByteHandle {
        self.next_id += 1;
        let id = self.next_id;
        debug!("registered handle {} ({} bytes)", id, bytes.len());
        self.live.insert(id, bytes);
        ByteHandle(id)
    }

    pub fn bytes(&self, handle: &ByteHandle) -> Option<Arc<[u8]>> {
        self.live.get(&handle.0).cloned()
    }

    pub fn release(&mut self, handle: ByteHandle) {
        if self.live.remove(&handle.0).is_some() {
            self.released += 1;
            debug!("released handle {}", handle.0);
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn released_count(&self) -> u64 {
        self.released
    }
}

impl fmt::Debug for HandleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleStore")
            .field("live", &self.live.len())
            .field("released", &self.released)
            .finish()
    }
}
