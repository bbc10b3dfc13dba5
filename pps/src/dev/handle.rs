//! Shared-ownership handle for objects that cross into interrupt context.
//!
//! [Handle<T>] owns a strong reference to an object using [alloc::sync::Arc]. Use it where
//! a collaborator outside the driver must keep an object alive, e.g. the interrupt subsystem
//! holding the handler, or the PPS subsystem holding the registered source.
//!
//! Key guarantees and semantics:
//! - Cloning a handle never clones the object.
//! - The object is dropped when the last handle is dropped, so the release work done by its
//!   `Drop` implementation runs exactly once no matter which holder lets go last.
use alloc::sync::Arc;
use core::ops::Deref;

#[derive(Debug)]
/// Strong owning handle backed by [Arc<T>].
pub struct Handle<T: ?Sized> {
    inner: Arc<T>,
}

impl<T: ?Sized> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &*self.inner
    }
}

impl<T> From<T> for Handle<T> {
    fn from(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: ?Sized> Handle<T> {
    /// Wrap an existing [Arc], e.g. one already coerced into a trait object.
    pub fn from_arc(inner: Arc<T>) -> Handle<T> {
        Handle { inner }
    }

    /// Number of live handles, this one included.
    pub fn holders(this: &Handle<T>) -> usize {
        Arc::strong_count(&this.inner)
    }
}
