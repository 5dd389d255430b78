//! Output buffers for ordered-object.
//!
//! - [`Writer`] — auto-growing byte buffer with a write cursor.
//! - [`WriterPool`] — shared pool of writers, checked out as [`PooledWriter`]
//!   guards that go back to the pool when dropped.

mod pool;
mod writer;

pub use pool::{PooledWriter, WriterPool, DEFAULT_MAX_IDLE, DEFAULT_MAX_RETAINED_SIZE};
pub use writer::{Writer, DEFAULT_ALLOC_SIZE};
