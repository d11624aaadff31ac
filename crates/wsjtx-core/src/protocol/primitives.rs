//! Big-endian primitive codec for the WSJT-X UDP wire format.
//!
//! Wire widths:
//! ```text
//! quint32 / qint32 / QTime : 4 bytes, big-endian
//! quint8 / bool            : 1 byte  (bool: 0 = false, anything else = true)
//! double                   : 8 bytes, IEEE-754 big-endian
//! utf8                     : [len:4][bytes:len]   len 0 or 0xFFFFFFFF => ""
//! ```
//!
//! # Why a cursor instead of offsets? (for beginners)
//!
//! A WSJT-X datagram carries no field tags and no resynchronisation marker.
//! The only way to know where field N starts is to have decoded fields
//! 0..N-1 correctly.  [`WireReader`] therefore owns the read position and
//! only moves forward.  As soon as one read fails the reader *latches*: every
//! later call returns [`ProtocolError::StreamAbandoned`] without touching the
//! underlying stream.  A caller cannot "rewind and retry" a failed field; it
//! has to drop the reader and treat the whole message as lost.
//!
//! [`WireWriter`] applies the same rule to output.

use std::io::{ErrorKind, Read, Write};

use crate::protocol::codec::ProtocolError;
use crate::protocol::messages::STRING_NULL_SENTINEL;

// ── Reader ────────────────────────────────────────────────────────────────────

/// Forward-only decoding cursor over any [`Read`] source.
///
/// # Examples
///
/// ```rust
/// use wsjtx_core::protocol::primitives::WireReader;
///
/// let bytes = [0x00, 0x00, 0x00, 0x2A, 0x01];
/// let mut reader = WireReader::new(&bytes[..]);
/// assert_eq!(reader.read_u32("count").unwrap(), 42);
/// assert!(reader.read_bool("flag").unwrap());
/// assert_eq!(reader.position(), 5);
/// ```
#[derive(Debug)]
pub struct WireReader<R> {
    inner: R,
    position: usize,
    abandoned: bool,
}

impl<R: Read> WireReader<R> {
    /// Wraps `inner`; the position starts at 0.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            position: 0,
            abandoned: false,
        }
    }

    /// Number of bytes consumed by successful reads so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns `true` once any read on this cursor has failed.
    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    /// Gives back the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads a big-endian `quint32`.
    pub fn read_u32(&mut self, field: &'static str) -> Result<u32, ProtocolError> {
        self.read_array::<4>(field).map(u32::from_be_bytes)
    }

    /// Reads a big-endian two's-complement `qint32`.
    pub fn read_i32(&mut self, field: &'static str) -> Result<i32, ProtocolError> {
        self.read_array::<4>(field).map(i32::from_be_bytes)
    }

    /// Reads a single `quint8`.
    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, ProtocolError> {
        self.read_array::<1>(field).map(|b| b[0])
    }

    /// Reads a one-byte boolean.  Any nonzero byte is `true`.
    pub fn read_bool(&mut self, field: &'static str) -> Result<bool, ProtocolError> {
        self.read_u8(field).map(|b| b != 0)
    }

    /// Reads an IEEE-754 big-endian `double`.
    pub fn read_f64(&mut self, field: &'static str) -> Result<f64, ProtocolError> {
        self.read_array::<8>(field).map(f64::from_be_bytes)
    }

    /// Reads a `QTime`.  On the wire this is a plain `quint32`.
    pub fn read_time(&mut self, field: &'static str) -> Result<u32, ProtocolError> {
        self.read_u32(field)
    }

    /// Reads a length-prefixed UTF-8 string.
    ///
    /// A length of `0` or [`STRING_NULL_SENTINEL`] yields `""` and consumes
    /// nothing past the 4-byte prefix.  Otherwise exactly `len` bytes are
    /// consumed; embedded NUL bytes are kept as content.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::ShortRead`] when the stream ends before `len` bytes,
    /// [`ProtocolError::InvalidUtf8`] when the bytes are not valid UTF-8.
    pub fn read_utf8(&mut self, field: &'static str) -> Result<String, ProtocolError> {
        let len = self.read_u32(field)?;
        if len == 0 || len == STRING_NULL_SENTINEL {
            return Ok(String::new());
        }

        // The prefix is untrusted; `take` bounds the read by what the source
        // actually holds instead of allocating `len` bytes up front.
        let needed = len as usize;
        let mut bytes = Vec::new();
        if let Err(e) = (&mut self.inner).take(u64::from(len)).read_to_end(&mut bytes) {
            return Err(self.abandon(ProtocolError::ReadFailed {
                field,
                kind: e.kind(),
            }));
        }
        if bytes.len() < needed {
            let available = bytes.len();
            return Err(self.abandon(ProtocolError::ShortRead {
                field,
                needed,
                available,
            }));
        }

        let start = self.position;
        self.position += needed;
        String::from_utf8(bytes).map_err(|e| {
            let position = start + e.utf8_error().valid_up_to();
            self.abandon(ProtocolError::InvalidUtf8 { field, position })
        })
    }

    /// Drains everything left in the source.
    ///
    /// Used for payloads whose layout the caller does not model.
    pub fn read_remaining(&mut self, field: &'static str) -> Result<Vec<u8>, ProtocolError> {
        self.ensure_live()?;
        let mut rest = Vec::new();
        if let Err(e) = self.inner.read_to_end(&mut rest) {
            return Err(self.abandon(ProtocolError::ReadFailed {
                field,
                kind: e.kind(),
            }));
        }
        self.position += rest.len();
        Ok(rest)
    }

    fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], ProtocolError> {
        self.ensure_live()?;
        let mut buf = [0u8; N];
        let mut filled = 0;
        while filled < N {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(self.abandon(ProtocolError::ShortRead {
                        field,
                        needed: N,
                        available: filled,
                    }));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(self.abandon(ProtocolError::ReadFailed {
                        field,
                        kind: e.kind(),
                    }));
                }
            }
        }
        self.position += N;
        Ok(buf)
    }

    fn ensure_live(&self) -> Result<(), ProtocolError> {
        if self.abandoned {
            Err(ProtocolError::StreamAbandoned)
        } else {
            Ok(())
        }
    }

    fn abandon(&mut self, err: ProtocolError) -> ProtocolError {
        self.abandoned = true;
        err
    }
}

// ── Writer ────────────────────────────────────────────────────────────────────

/// Forward-only encoding cursor over any [`Write`] sink.
///
/// # Examples
///
/// ```rust
/// use wsjtx_core::protocol::primitives::WireWriter;
///
/// let mut writer = WireWriter::new(Vec::new());
/// writer.write_u32("magic", 0xADBC_CBDA).unwrap();
/// writer.write_bool("flag", true).unwrap();
/// assert_eq!(writer.into_inner(), vec![0xAD, 0xBC, 0xCB, 0xDA, 0x01]);
/// ```
#[derive(Debug)]
pub struct WireWriter<W> {
    inner: W,
    position: usize,
    abandoned: bool,
}

impl<W: Write> WireWriter<W> {
    /// Wraps `inner`; the position starts at 0.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            position: 0,
            abandoned: false,
        }
    }

    /// Number of bytes handed to the sink so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns `true` once any write on this cursor has failed.
    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    /// Gives back the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u32(&mut self, field: &'static str, value: u32) -> Result<(), ProtocolError> {
        self.put(field, &value.to_be_bytes())
    }

    pub fn write_i32(&mut self, field: &'static str, value: i32) -> Result<(), ProtocolError> {
        self.put(field, &value.to_be_bytes())
    }

    pub fn write_u8(&mut self, field: &'static str, value: u8) -> Result<(), ProtocolError> {
        self.put(field, &[value])
    }

    /// Writes `true` as `0x01` and `false` as `0x00`; no other byte is emitted.
    pub fn write_bool(&mut self, field: &'static str, value: bool) -> Result<(), ProtocolError> {
        self.put(field, &[u8::from(value)])
    }

    pub fn write_f64(&mut self, field: &'static str, value: f64) -> Result<(), ProtocolError> {
        self.put(field, &value.to_be_bytes())
    }

    pub fn write_time(&mut self, field: &'static str, value: u32) -> Result<(), ProtocolError> {
        self.write_u32(field, value)
    }

    /// Writes the byte length as a `quint32` prefix followed by the raw bytes.
    ///
    /// The null sentinel is never emitted: an empty string is written as
    /// length `0`, which decoders treat the same as null.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::StringTooLong`] if the length collides with the
    /// sentinel or does not fit in 32 bits.  Nothing is written in that case.
    pub fn write_utf8(&mut self, field: &'static str, value: &str) -> Result<(), ProtocolError> {
        let bytes = value.as_bytes();
        let len = u32::try_from(bytes.len())
            .ok()
            .filter(|&n| n != STRING_NULL_SENTINEL)
            .ok_or(ProtocolError::StringTooLong(bytes.len()))?;
        self.put(field, &len.to_be_bytes())?;
        self.put(field, bytes)
    }

    /// Writes `bytes` verbatim with no prefix.
    pub fn write_raw(&mut self, field: &'static str, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.put(field, bytes)
    }

    fn put(&mut self, field: &'static str, bytes: &[u8]) -> Result<(), ProtocolError> {
        if self.abandoned {
            return Err(ProtocolError::StreamAbandoned);
        }
        if bytes.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.inner.write_all(bytes) {
            self.abandoned = true;
            return Err(ProtocolError::WriteFailed {
                field,
                kind: e.kind(),
            });
        }
        self.position += bytes.len();
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn written<F>(f: F) -> Vec<u8>
    where
        F: FnOnce(&mut WireWriter<Vec<u8>>) -> Result<(), ProtocolError>,
    {
        let mut w = WireWriter::new(Vec::new());
        f(&mut w).expect("write failed");
        w.into_inner()
    }

    /// A sink that accepts `capacity` bytes and then refuses everything.
    struct FullSink {
        capacity: usize,
        data: Vec<u8>,
    }

    impl Write for FullSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let room = self.capacity - self.data.len();
            let n = room.min(buf.len());
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    // ── Integers ──────────────────────────────────────────────────────────────

    #[test]
    fn test_u32_is_big_endian_and_four_bytes() {
        let bytes = written(|w| w.write_u32("v", 0x0102_0304));
        assert_eq!(bytes, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_u32_extremes_round_trip() {
        for v in [0u32, 1, 0x7FFF_FFFF, u32::MAX] {
            let bytes = written(|w| w.write_u32("v", v));
            assert_eq!(bytes.len(), 4);
            let mut r = WireReader::new(&bytes[..]);
            assert_eq!(r.read_u32("v").unwrap(), v);
        }
    }

    #[test]
    fn test_i32_negative_uses_twos_complement() {
        let bytes = written(|w| w.write_i32("snr", -5));
        assert_eq!(bytes, vec![0xFF, 0xFF, 0xFF, 0xFB]);
        let mut r = WireReader::new(&bytes[..]);
        assert_eq!(r.read_i32("snr").unwrap(), -5);
    }

    #[test]
    fn test_i32_min_and_max_round_trip() {
        for v in [i32::MIN, -1, 0, i32::MAX] {
            let bytes = written(|w| w.write_i32("v", v));
            let mut r = WireReader::new(&bytes[..]);
            assert_eq!(r.read_i32("v").unwrap(), v);
        }
    }

    #[test]
    fn test_u8_is_identity() {
        let bytes = written(|w| w.write_u8("flags", 0xA5));
        assert_eq!(bytes, vec![0xA5]);
        let mut r = WireReader::new(&bytes[..]);
        assert_eq!(r.read_u8("flags").unwrap(), 0xA5);
    }

    #[test]
    fn test_time_is_encoded_as_u32() {
        let bytes = written(|w| w.write_time("time", 120_000));
        assert_eq!(bytes, 120_000u32.to_be_bytes().to_vec());
        let mut r = WireReader::new(&bytes[..]);
        assert_eq!(r.read_time("time").unwrap(), 120_000);
    }

    // ── Bool ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_bool_writes_exactly_zero_or_one() {
        assert_eq!(written(|w| w.write_bool("b", true)), vec![0x01]);
        assert_eq!(written(|w| w.write_bool("b", false)), vec![0x00]);
    }

    #[test]
    fn test_bool_any_nonzero_byte_reads_true() {
        let bytes = [0x00, 0x01, 0x02, 0xFF];
        let mut r = WireReader::new(&bytes[..]);
        assert!(!r.read_bool("b").unwrap());
        assert!(r.read_bool("b").unwrap());
        assert!(r.read_bool("b").unwrap());
        assert!(r.read_bool("b").unwrap());
    }

    // ── Float ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_f64_is_ieee754_big_endian() {
        let bytes = written(|w| w.write_f64("dt", 0.5));
        assert_eq!(bytes, vec![0x3F, 0xE0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_f64_special_values_round_trip() {
        for v in [0.0f64, -0.0, -1.25, f64::MAX, f64::MIN_POSITIVE, f64::INFINITY] {
            let bytes = written(|w| w.write_f64("v", v));
            let mut r = WireReader::new(&bytes[..]);
            assert_eq!(r.read_f64("v").unwrap().to_bits(), v.to_bits());
        }
    }

    #[test]
    fn test_f64_nan_bits_survive() {
        let bytes = written(|w| w.write_f64("v", f64::NAN));
        let mut r = WireReader::new(&bytes[..]);
        assert!(r.read_f64("v").unwrap().is_nan());
    }

    // ── Strings ───────────────────────────────────────────────────────────────

    #[test]
    fn test_utf8_prefix_is_byte_length() {
        let bytes = written(|w| w.write_utf8("s", "FT8"));
        assert_eq!(bytes, vec![0, 0, 0, 3, b'F', b'T', b'8']);
    }

    #[test]
    fn test_utf8_multibyte_length_counts_bytes_not_chars() {
        let bytes = written(|w| w.write_utf8("s", "é"));
        assert_eq!(&bytes[..4], &2u32.to_be_bytes());
        let mut r = WireReader::new(&bytes[..]);
        assert_eq!(r.read_utf8("s").unwrap(), "é");
    }

    #[test]
    fn test_utf8_empty_encodes_zero_length_not_sentinel() {
        let bytes = written(|w| w.write_utf8("s", ""));
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        let mut r = WireReader::new(&bytes[..]);
        assert_eq!(r.read_utf8("s").unwrap(), "");
    }

    #[test]
    fn test_utf8_null_sentinel_consumes_only_prefix() {
        // Sentinel followed by a trailing byte that must not be consumed.
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        let mut r = WireReader::new(&bytes[..]);
        assert_eq!(r.read_utf8("s").unwrap(), "");
        assert_eq!(r.position(), 4);
        assert!(r.read_bool("next").unwrap());
    }

    #[test]
    fn test_utf8_embedded_nul_is_content() {
        let bytes = written(|w| w.write_utf8("s", "a\0b"));
        let mut r = WireReader::new(&bytes[..]);
        assert_eq!(r.read_utf8("s").unwrap(), "a\0b");
    }

    #[test]
    fn test_utf8_short_payload_is_short_read() {
        let bytes = [0, 0, 0, 5, b'a', b'b'];
        let mut r = WireReader::new(&bytes[..]);
        assert_eq!(
            r.read_utf8("id"),
            Err(ProtocolError::ShortRead {
                field: "id",
                needed: 5,
                available: 2
            })
        );
    }

    #[test]
    fn test_utf8_huge_declared_length_fails_without_hanging() {
        let bytes = [0x7F, 0xFF, 0xFF, 0xFF, b'x'];
        let mut r = WireReader::new(&bytes[..]);
        assert!(matches!(
            r.read_utf8("message"),
            Err(ProtocolError::ShortRead { available: 1, .. })
        ));
    }

    #[test]
    fn test_utf8_invalid_bytes_are_rejected() {
        let bytes = [0, 0, 0, 2, 0xC3, 0x28];
        let mut r = WireReader::new(&bytes[..]);
        assert_eq!(
            r.read_utf8("mode"),
            Err(ProtocolError::InvalidUtf8 {
                field: "mode",
                position: 4
            })
        );
    }

    // ── Failure contract ──────────────────────────────────────────────────────

    #[test]
    fn test_read_on_empty_stream_is_short_read() {
        let mut r = WireReader::new(&[][..]);
        assert_eq!(
            r.read_u32("magic"),
            Err(ProtocolError::ShortRead {
                field: "magic",
                needed: 4,
                available: 0
            })
        );
    }

    #[test]
    fn test_partial_scalar_reports_available_bytes() {
        let bytes = [0x3F, 0xE0, 0x00];
        let mut r = WireReader::new(&bytes[..]);
        assert_eq!(
            r.read_f64("delta_time"),
            Err(ProtocolError::ShortRead {
                field: "delta_time",
                needed: 8,
                available: 3
            })
        );
    }

    #[test]
    fn test_reader_latches_after_failure() {
        let bytes = [0x01, 0x02];
        let mut r = WireReader::new(&bytes[..]);
        assert!(r.read_u32("a").is_err());
        assert!(r.is_abandoned());
        assert_eq!(r.read_u8("b"), Err(ProtocolError::StreamAbandoned));
        assert_eq!(r.read_remaining("rest"), Err(ProtocolError::StreamAbandoned));
    }

    #[test]
    fn test_read_remaining_drains_stream() {
        let bytes = [0, 0, 0, 1, 9, 8, 7];
        let mut r = WireReader::new(&bytes[..]);
        r.read_u32("head").unwrap();
        assert_eq!(r.read_remaining("rest").unwrap(), vec![9, 8, 7]);
        assert_eq!(r.position(), 7);
        assert_eq!(r.read_remaining("rest").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_write_to_full_sink_fails_and_latches() {
        let mut w = WireWriter::new(FullSink {
            capacity: 5,
            data: Vec::new(),
        });
        w.write_u32("magic", 1).unwrap();
        assert_eq!(
            w.write_u32("schema", 2),
            Err(ProtocolError::WriteFailed {
                field: "schema",
                kind: ErrorKind::WriteZero
            })
        );
        assert_eq!(w.write_u8("x", 0), Err(ProtocolError::StreamAbandoned));
        assert_eq!(w.position(), 4);
    }

    #[test]
    fn test_writer_position_tracks_bytes() {
        let mut w = WireWriter::new(Vec::new());
        w.write_utf8("id", "WSJT-X").unwrap();
        w.write_bool("new", true).unwrap();
        w.write_f64("dt", 1.0).unwrap();
        assert_eq!(w.position(), 4 + 6 + 1 + 8);
        assert_eq!(w.into_inner().len(), 19);
    }
}
