//! `JsonStream` — writes JSON tokens into a pooled [`Writer`].
//!
//! Primitive writes never return errors directly. A value that cannot be
//! written (NaN, a failing structural encode) is recorded in the stream and
//! read back, and cleared, with [`JsonStream::take_error`].

use std::io;

use ordered_object_buffers::PooledWriter;
use serde_json::ser::Formatter;

use crate::config::JsonConfig;
use crate::error::EncodeError;
use crate::value::{JsonValue, SerializeJson};

const HEX: &[u8; 16] = b"0123456789abcdef";

pub struct JsonStream<'c> {
    writer: PooledWriter<'c>,
    config: &'c JsonConfig,
    error: Option<EncodeError>,
}

impl std::fmt::Debug for JsonStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStream")
            .field("buffer", &String::from_utf8_lossy(self.buffer()))
            .field("escape_html", &self.config.escape_html())
            .field("error", &self.error)
            .finish()
    }
}

impl<'c> JsonStream<'c> {
    pub(crate) fn new(writer: PooledWriter<'c>, config: &'c JsonConfig) -> Self {
        Self {
            writer,
            config,
            error: None,
        }
    }

    /// The config this stream was borrowed from.
    pub fn config(&self) -> &'c JsonConfig {
        self.config
    }

    /// Bytes written so far.
    pub fn buffer(&self) -> &[u8] {
        self.writer.as_slice()
    }

    /// Copies the written bytes out of the pooled buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        self.buffer().to_vec()
    }

    /// The pending error, if any.
    pub fn error(&self) -> Option<&EncodeError> {
        self.error.as_ref()
    }

    /// Returns the pending error and clears it.
    pub fn take_error(&mut self) -> Option<EncodeError> {
        self.error.take()
    }

    /// Keeps the first error; later ones are consequences of it.
    fn set_error(&mut self, err: EncodeError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Writes one value, dispatching on its [`JsonValue`] kind.
    ///
    /// A [`MarshalJson`](crate::MarshalJson) value is encoded with this
    /// stream's config and its errors are returned as-is; errors recorded by
    /// the primitive writers are taken off the stream and returned.
    pub fn write_value(&mut self, value: &JsonValue<'_>) -> Result<(), EncodeError> {
        match *value {
            JsonValue::Null => self.write_null(),
            JsonValue::Str(s) => self.write_str(s),
            JsonValue::Bool(b) => self.write_boolean(b),
            JsonValue::I8(v) => self.write_i8(v),
            JsonValue::I16(v) => self.write_i16(v),
            JsonValue::I32(v) => self.write_i32(v),
            JsonValue::I64(v) => self.write_i64(v),
            JsonValue::Isize(v) => self.write_isize(v),
            JsonValue::U8(v) => self.write_u8(v),
            JsonValue::U16(v) => self.write_u16(v),
            JsonValue::U32(v) => self.write_u32(v),
            JsonValue::U64(v) => self.write_u64(v),
            JsonValue::Usize(v) => self.write_usize(v),
            JsonValue::F32(v) => self.write_f32(v),
            JsonValue::F64(v) => self.write_f64(v),
            JsonValue::Marshaler(m) => {
                let data = m.marshal_json_with(self.config)?;
                self.write_raw(&data);
            }
            JsonValue::Structural(s) => self.write_structural(s),
        }
        match self.take_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn write_null(&mut self) {
        self.writer.ascii("null");
    }

    pub fn write_boolean(&mut self, b: bool) {
        if b {
            self.writer.ascii("true");
        } else {
            self.writer.ascii("false");
        }
    }

    pub fn write_i8(&mut self, int: i8) {
        self.writer.ascii(&int.to_string());
    }

    pub fn write_i16(&mut self, int: i16) {
        self.writer.ascii(&int.to_string());
    }

    pub fn write_i32(&mut self, int: i32) {
        self.writer.ascii(&int.to_string());
    }

    pub fn write_i64(&mut self, int: i64) {
        self.writer.ascii(&int.to_string());
    }

    pub fn write_isize(&mut self, int: isize) {
        self.writer.ascii(&int.to_string());
    }

    pub fn write_u8(&mut self, uint: u8) {
        self.writer.ascii(&uint.to_string());
    }

    pub fn write_u16(&mut self, uint: u16) {
        self.writer.ascii(&uint.to_string());
    }

    pub fn write_u32(&mut self, uint: u32) {
        self.writer.ascii(&uint.to_string());
    }

    pub fn write_u64(&mut self, uint: u64) {
        self.writer.ascii(&uint.to_string());
    }

    pub fn write_usize(&mut self, uint: usize) {
        self.writer.ascii(&uint.to_string());
    }

    pub fn write_f32(&mut self, float: f32) {
        if !float.is_finite() {
            self.set_error(EncodeError::UnsupportedFloat(f64::from(float)));
            return;
        }
        let abs = f64::from(float.abs());
        self.writer.ascii(&format_float(float, abs));
    }

    pub fn write_f64(&mut self, float: f64) {
        if !float.is_finite() {
            self.set_error(EncodeError::UnsupportedFloat(float));
            return;
        }
        self.writer.ascii(&format_float(float, float.abs()));
    }

    /// Write a JSON-encoded string (with escaping).
    pub fn write_str(&mut self, s: &str) {
        let bytes = s.as_bytes();
        let len = bytes.len();
        let escape_html = self.config.escape_html();

        // Fast path: nothing to escape, copy in one go.
        if !bytes.iter().any(|&b| self.needs_escape(b)) {
            self.writer.ensure_capacity(len + 2);
            self.writer.u8(b'"');
            self.writer.buf(bytes);
            self.writer.u8(b'"');
            return;
        }

        self.writer.ensure_capacity(len + len / 2 + 2);
        self.writer.u8(b'"');
        let mut last = 0;
        let mut i = 0;
        while i < len {
            let b = bytes[i];
            let width = match b {
                b'"' | b'\\' => 1,
                0x00..=0x1f => 1,
                b'<' | b'>' | b'&' if escape_html => 1,
                // U+2028 / U+2029 are E2 80 A8 / E2 80 A9.
                0xe2 if escape_html
                    && i + 2 < len
                    && bytes[i + 1] == 0x80
                    && (bytes[i + 2] == 0xa8 || bytes[i + 2] == 0xa9) =>
                {
                    3
                }
                _ => 0,
            };
            if width == 0 {
                i += 1;
                continue;
            }
            self.writer.buf(&bytes[last..i]);
            match b {
                b'"' => self.writer.u8u8(b'\\', b'"'),
                b'\\' => self.writer.u8u8(b'\\', b'\\'),
                0x08 => self.writer.u8u8(b'\\', b'b'),
                b'\t' => self.writer.u8u8(b'\\', b't'),
                b'\n' => self.writer.u8u8(b'\\', b'n'),
                0x0c => self.writer.u8u8(b'\\', b'f'),
                b'\r' => self.writer.u8u8(b'\\', b'r'),
                0xe2 if bytes[i + 2] == 0xa8 => self.write_unicode_escape(0x2028),
                0xe2 => self.write_unicode_escape(0x2029),
                _ => self.write_unicode_escape(u16::from(b)),
            }
            i += width;
            last = i;
        }
        self.writer.buf(&bytes[last..]);
        self.writer.u8(b'"');
    }

    fn needs_escape(&self, b: u8) -> bool {
        match b {
            b'"' | b'\\' | 0x00..=0x1f => true,
            b'<' | b'>' | b'&' | 0xe2 => self.config.escape_html(),
            _ => false,
        }
    }

    fn write_unicode_escape(&mut self, code: u16) {
        let c = usize::from(code);
        self.writer.buf(&[
            b'\\',
            b'u',
            HEX[(c >> 12) & 0xf],
            HEX[(c >> 8) & 0xf],
            HEX[(c >> 4) & 0xf],
            HEX[c & 0xf],
        ]);
    }

    /// Splices already-encoded JSON into the output verbatim.
    pub fn write_raw(&mut self, data: &[u8]) {
        self.writer.buf(data);
    }

    /// Encodes an arbitrary serde value straight into the buffer.
    pub fn write_structural(&mut self, value: &dyn SerializeJson) {
        if let Err(err) = value.write_json(&mut self.writer, self.config.escape_html()) {
            self.set_error(EncodeError::Structural(err));
        }
    }

    // ---- Streaming ----

    pub fn write_object_start(&mut self) {
        self.writer.u8(b'{');
    }

    pub fn write_object_end(&mut self) {
        self.writer.u8(b'}');
    }

    /// Writes `"key":`.
    pub fn write_object_field(&mut self, key: &str) {
        self.write_str(key);
        self.writer.u8(b':');
    }

    /// Member / element separator.
    pub fn write_more(&mut self) {
        self.writer.u8(b',');
    }
}

/// Shortest round-trip literal; exponent form below 1e-6 and from 1e21 on.
fn format_float<F: std::fmt::Display + std::fmt::LowerExp>(float: F, abs: f64) -> String {
    if abs != 0.0 && !(1e-6..1e21).contains(&abs) {
        format!("{:e}", float)
    } else {
        format!("{}", float)
    }
}

/// serde_json formatter that additionally escapes HTML-sensitive characters.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct HtmlSafeFormatter;

impl Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut last = 0;
        for (i, ch) in fragment.char_indices() {
            let escaped = match ch {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[last..i].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            last = i + ch.len_utf8();
        }
        writer.write_all(fragment[last..].as_bytes())
    }
}
