//! Shared pool of [`Writer`]s with scoped checkout.
//!
//! A writer is taken out with [`WriterPool::borrow`] and handed back when the
//! returned [`PooledWriter`] guard is dropped, so every exit path of the
//! caller (including `?` early returns) gives it back exactly once.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

use log::trace;

use crate::writer::{Writer, DEFAULT_ALLOC_SIZE};

/// Writers whose buffer grew past this size are dropped instead of pooled.
pub const DEFAULT_MAX_RETAINED_SIZE: usize = 64 * 1024;

/// Maximum number of idle writers kept by a pool.
pub const DEFAULT_MAX_IDLE: usize = 16;

pub struct WriterPool {
    free: Mutex<Vec<Writer>>,
    alloc_size: usize,
    max_retained_size: usize,
    max_idle: usize,
}

impl Default for WriterPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WriterPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterPool")
            .field("idle", &self.idle())
            .field("alloc_size", &self.alloc_size)
            .field("max_retained_size", &self.max_retained_size)
            .field("max_idle", &self.max_idle)
            .finish()
    }
}

impl WriterPool {
    pub const fn new() -> Self {
        Self::with_limits(DEFAULT_ALLOC_SIZE, DEFAULT_MAX_RETAINED_SIZE, DEFAULT_MAX_IDLE)
    }

    /// Creates a pool whose fresh writers start at `alloc_size` bytes, which
    /// keeps at most `max_idle` writers and refuses writers larger than
    /// `max_retained_size`.
    pub const fn with_limits(alloc_size: usize, max_retained_size: usize, max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            alloc_size,
            max_retained_size,
            max_idle,
        }
    }

    pub fn alloc_size(&self) -> usize {
        self.alloc_size
    }

    pub fn max_retained_size(&self) -> usize {
        self.max_retained_size
    }

    pub fn max_idle(&self) -> usize {
        self.max_idle
    }

    /// Number of writers currently waiting in the pool.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Checks a writer out of the pool, allocating a new one if none is idle.
    ///
    /// The lock is held only for the pop, never while the writer is in use,
    /// so a caller may borrow a second writer while holding the first.
    pub fn borrow(&self) -> PooledWriter<'_> {
        let pooled = self.free.lock().unwrap_or_else(PoisonError::into_inner).pop();
        let writer = match pooled {
            Some(writer) => writer,
            None => {
                trace!("writer pool empty, allocating {} bytes", self.alloc_size);
                Writer::with_alloc_size(self.alloc_size)
            }
        };
        PooledWriter {
            pool: self,
            writer: Some(writer),
        }
    }

    fn release(&self, mut writer: Writer) {
        if writer.capacity() > self.max_retained_size {
            trace!(
                "dropping writer of {} bytes instead of returning it to the pool",
                writer.capacity()
            );
            return;
        }
        writer.clear();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.max_idle {
            free.push(writer);
        }
    }
}

/// A [`Writer`] checked out of a [`WriterPool`]; returned to it on drop.
pub struct PooledWriter<'a> {
    pool: &'a WriterPool,
    writer: Option<Writer>,
}

impl PooledWriter<'_> {
    fn inner(&self) -> &Writer {
        match &self.writer {
            Some(writer) => writer,
            None => unreachable!("pooled writer used after release"),
        }
    }

    fn inner_mut(&mut self) -> &mut Writer {
        match &mut self.writer {
            Some(writer) => writer,
            None => unreachable!("pooled writer used after release"),
        }
    }
}

impl Deref for PooledWriter<'_> {
    type Target = Writer;

    fn deref(&self) -> &Writer {
        self.inner()
    }
}

impl DerefMut for PooledWriter<'_> {
    fn deref_mut(&mut self) -> &mut Writer {
        self.inner_mut()
    }
}

impl Drop for PooledWriter<'_> {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            self.pool.release(writer);
        }
    }
}
