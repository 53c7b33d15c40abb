//! Owned sub-resources released exactly once.
//!
//! Every interface instance keeps a [`Disposals`] list of the handles it
//! creates (windows, subscriptions, timers). The primary path is
//! [`Disposals::dispose_all`], run when the instance closes. If an instance is
//! dropped without ever closing, [`Disposals::release_leaked`] is the safety
//! net: it releases what is left and swallows any panic a handle raises.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

/// A resource that can be released once.
///
/// Taking `self: Box<Self>` means a handle is consumed by its release and can
/// never be released twice.
pub trait Disposable: Send {
    /// Release the resource.
    fn dispose(self: Box<Self>);
}

impl<F: FnOnce() + Send> Disposable for F {
    fn dispose(self: Box<Self>) {
        (*self)()
    }
}

/// Ordered list of owned disposables.
#[derive(Default)]
pub struct Disposals {
    handles: Vec<Box<dyn Disposable>>,
    disposed: bool,
}

impl std::fmt::Debug for Disposals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposals")
            .field("pending", &self.handles.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl Disposals {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `handle`.
    ///
    /// A handle tracked after the list was disposed is released immediately.
    pub fn track(&mut self, handle: impl Disposable + 'static) {
        if self.disposed {
            debug!("tracking after disposal, releasing handle immediately");
            Box::new(handle).dispose();
            return;
        }
        self.handles.push(Box::new(handle));
    }

    /// Number of handles not yet released.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if nothing is waiting to be released.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Returns `true` once either release path has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release every handle in the order it was tracked.
    ///
    /// Returns how many handles were released; `0` on every call after the first.
    pub fn dispose_all(&mut self) -> usize {
        if self.disposed {
            return 0;
        }
        self.disposed = true;
        let count = self.handles.len();
        for handle in self.handles.drain(..) {
            handle.dispose();
        }
        count
    }

    /// Best-effort release for an owner that was never closed.
    ///
    /// Each handle is released in order; a panicking handle is logged and
    /// skipped. Returns how many handles released cleanly.
    pub fn release_leaked(&mut self) -> usize {
        if self.disposed {
            return 0;
        }
        self.disposed = true;
        let mut released = 0;
        for handle in self.handles.drain(..) {
            match panic::catch_unwind(AssertUnwindSafe(move || handle.dispose())) {
                Ok(()) => released += 1,
                Err(_) => warn!("disposable panicked during leaked release, ignoring"),
            }
        }
        released
    }
}
