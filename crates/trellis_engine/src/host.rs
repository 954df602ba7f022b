//! The environment a runtime is mounted in.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::dom::{Document, SharedDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

pub type TickCallback = Box<dyn FnOnce()>;

/// Document access and frame scheduling, as provided by a browser window.
pub trait Host {
    /// `None` when the host has no document to render into.
    fn document(&self) -> Option<SharedDocument>;

    /// Runs `callback` on the next frame.
    fn request_tick(&self, callback: TickCallback) -> TimerHandle;

    /// Cancels a pending callback. Unknown or already-fired handles are ignored.
    fn cancel_tick(&self, handle: TimerHandle);
}

/// Single-threaded host whose frames are flushed by the caller.
pub struct LocalHost {
    document: Option<SharedDocument>,
    next_handle: Cell<u64>,
    pending: RefCell<BTreeMap<TimerHandle, TickCallback>>,
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHost {
    pub fn new() -> Self {
        Self::with_document(Document::new().into_shared())
    }

    pub fn with_document(document: SharedDocument) -> Self {
        Self {
            document: Some(document),
            next_handle: Cell::new(0),
            pending: RefCell::new(BTreeMap::new()),
        }
    }

    /// A host without a document, e.g. a worker or a server process.
    pub fn headless() -> Self {
        Self {
            document: None,
            next_handle: Cell::new(0),
            pending: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn pending_ticks(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Runs every callback requested before this call, in request order.
    /// Callbacks requested while flushing wait for the next flush; callbacks
    /// cancelled while flushing are skipped.
    pub fn run_pending_ticks(&self) -> usize {
        let due: Vec<TimerHandle> = self.pending.borrow().keys().copied().collect();
        let mut ran = 0;
        for handle in due {
            let callback = self.pending.borrow_mut().remove(&handle);
            if let Some(callback) = callback {
                callback();
                ran += 1;
            }
        }
        ran
    }
}

impl Host for LocalHost {
    fn document(&self) -> Option<SharedDocument> {
        self.document.clone()
    }

    fn request_tick(&self, callback: TickCallback) -> TimerHandle {
        let handle = TimerHandle(self.next_handle.get());
        self.next_handle.set(self.next_handle.get() + 1);
        self.pending.borrow_mut().insert(handle, callback);
        handle
    }

    fn cancel_tick(&self, handle: TimerHandle) {
        self.pending.borrow_mut().remove(&handle);
    }
}
