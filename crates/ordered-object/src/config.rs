//! Encoder configuration and the writer pool it owns.

use ordered_object_buffers::{
    WriterPool, DEFAULT_ALLOC_SIZE, DEFAULT_MAX_IDLE, DEFAULT_MAX_RETAINED_SIZE,
};

use crate::stream::JsonStream;

static STANDARD: JsonConfig = JsonConfig::new();

/// Settings shared by every [`JsonStream`] borrowed from this config.
///
/// Each config owns its own [`WriterPool`]; streams check a writer out on
/// [`borrow_stream`](Self::borrow_stream) and hand it back when dropped.
///
/// ```
/// use ordered_object::{JsonConfig, OrderedObject};
///
/// let mut obj = OrderedObject::new();
/// obj.set("html", "<b>");
///
/// assert_eq!(obj.marshal_json().unwrap(), br#"{"html":"<b>"}"#);
///
/// let safe = JsonConfig::new().with_escape_html(true);
/// assert_eq!(obj.marshal_json_with(&safe).unwrap(), br#"{"html":"\u003cb\u003e"}"#);
/// ```
pub struct JsonConfig {
    escape_html: bool,
    pool: WriterPool,
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for JsonConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonConfig")
            .field("escape_html", &self.escape_html)
            .field("pool", &self.pool)
            .finish()
    }
}

impl JsonConfig {
    /// HTML escaping disabled, default buffer limits.
    pub const fn new() -> Self {
        Self {
            escape_html: false,
            pool: WriterPool::with_limits(
                DEFAULT_ALLOC_SIZE,
                DEFAULT_MAX_RETAINED_SIZE,
                DEFAULT_MAX_IDLE,
            ),
        }
    }

    /// The process-wide config used by
    /// [`OrderedObject::marshal_json`](crate::OrderedObject::marshal_json).
    pub fn standard() -> &'static JsonConfig {
        &STANDARD
    }

    /// When enabled, `<`, `>`, `&`, U+2028 and U+2029 inside strings are
    /// written as `\u` escapes.
    pub fn with_escape_html(mut self, escape_html: bool) -> Self {
        self.escape_html = escape_html;
        self
    }

    /// Replaces the writer pool: fresh writers start at `alloc_size` bytes,
    /// at most `max_idle` are kept and none larger than `max_retained_size`.
    pub fn with_buffer_limits(
        self,
        alloc_size: usize,
        max_retained_size: usize,
        max_idle: usize,
    ) -> Self {
        Self {
            escape_html: self.escape_html,
            pool: WriterPool::with_limits(alloc_size, max_retained_size, max_idle),
        }
    }

    pub fn escape_html(&self) -> bool {
        self.escape_html
    }

    pub fn pool(&self) -> &WriterPool {
        &self.pool
    }

    /// Checks a stream out of this config's pool.
    pub fn borrow_stream(&self) -> JsonStream<'_> {
        JsonStream::new(self.pool.borrow(), self)
    }
}
