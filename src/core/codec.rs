//! Canonical Record Encoding
//!
//! Every record that enters a hash tree is first encoded into a byte string
//! whose field order is fixed by the record's schema, never by the order a
//! serializer happens to visit fields in.
//!
//! Layout rules:
//! - integers are little-endian at their declared width
//! - strings are a u32 length prefix followed by UTF-8 bytes
//! - optional values are a presence byte (0/1) followed by the value if present

/// Byte-string builder for canonical record encodings.
#[derive(Clone, Debug, Default)]
pub struct CanonicalEncoder {
    buf: Vec<u8>,
}

impl CanonicalEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Create an encoder that starts with a record tag byte.
    pub fn with_tag(tag: u8) -> Self {
        let mut enc = Self::new();
        enc.put_u8(tag);
        enc
    }

    /// Append a u8.
    #[inline]
    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    /// Append a u32 (little-endian).
    #[inline]
    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Append a u64 (little-endian).
    #[inline]
    pub fn put_u64(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Append a length-prefixed string.
    pub fn put_str(&mut self, value: &str) -> &mut Self {
        // Names longer than u32::MAX bytes cannot be produced by any transition input.
        let len = u32::try_from(value.len()).unwrap_or(u32::MAX);
        self.put_u32(len);
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    /// Append an optional u64 with a presence byte.
    pub fn put_opt_u64(&mut self, value: Option<u64>) -> &mut Self {
        match value {
            Some(v) => {
                self.put_u8(1);
                self.put_u64(v)
            }
            None => self.put_u8(0),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the encoder and return the bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Types with a schema-fixed canonical byte encoding.
pub trait CanonicalEncode {
    /// Write this record's fields into the encoder, in schema order.
    fn encode_canonical(&self, enc: &mut CanonicalEncoder);

    /// Convenience: encode into a fresh byte vector.
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut enc = CanonicalEncoder::new();
        self.encode_canonical(&mut enc);
        enc.finish()
    }
}
