//! Parsing utility functions

use std::io::{self, Read};
use std::slice::Iter;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{Error, Violation};

/// Largest value a [VarInt] can hold
pub const MAX_REMAINING_LENGTH: usize = 268_435_455;

/// Largest payload of a length-prefixed string or byte sequence
pub const MAX_STRING_LENGTH: usize = u16::MAX as usize;

/// Remaining length of a packet, as a value together with the number of bytes
/// it takes on the wire.
///
/// Seven bits of the value go into each byte, least significant group first. The
/// top bit of a byte says whether another one follows. At most four bytes are
/// allowed, which caps the value at [MAX_REMAINING_LENGTH].
///
/// See [specification](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718023).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VarInt {
    value: u32,
    length: u8,
}

const CONTINUATION: u8 = 0b1000_0000;
const GROUP: u8 = 0b0111_1111;

impl PartialEq<usize> for VarInt {
    fn eq(&self, other: &usize) -> bool {
        self.value() == *other
    }
}

impl PartialOrd<usize> for VarInt {
    fn partial_cmp(&self, other: &usize) -> Option<std::cmp::Ordering> {
        self.value().partial_cmp(other)
    }
}

impl VarInt {
    /// Creates the minimal encoding of `value`
    ///
    /// # Errors
    /// [Error::ValueOutOfRange] above [MAX_REMAINING_LENGTH]
    pub fn new(value: usize) -> Result<Self, Error> {
        if value > MAX_REMAINING_LENGTH {
            return Err(Error::ValueOutOfRange {
                value,
                max: MAX_REMAINING_LENGTH,
            });
        }

        // one byte per started group of 7 bits
        let mut length = 1;
        while value >> (7 * length) != 0 {
            length += 1;
        }

        Ok(Self {
            value: value as u32,
            length,
        })
    }

    pub const fn value(&self) -> usize {
        self.value as usize
    }

    /// Bytes taken on the wire. Non-minimal encodings keep their original length.
    pub const fn length(&self) -> usize {
        self.length as usize
    }

    /// Decodes the remaining length at the start of `stream`.
    ///
    /// [Error::InsufficientData] if the stream ends while a byte still announces
    /// a successor, [Error::MalformedVarint] if the fourth byte does.
    pub fn read(stream: Iter<u8>) -> Result<Self, Error> {
        let mut value = 0u32;
        let mut length = 0u8;

        for &byte in stream.take(4) {
            value |= u32::from(byte & GROUP) << (7 * length);
            length += 1;
            if byte & CONTINUATION == 0 {
                return Ok(Self { value, length });
            }
        }

        match length {
            4 => Err(Error::MalformedVarint),
            _ => Err(Error::InsufficientData(1)),
        }
    }

    /// Read a variable byte integer from a reader, one byte at a time.
    ///
    /// Returns the integer along with the bytes it was encoded in, so that
    /// callers relaying the packet can forward them untouched.
    pub fn read_from<R: Read>(src: &mut R) -> Result<(Self, [u8; 4]), Error> {
        let mut encoded = [0u8; 4];
        for i in 0..encoded.len() {
            read_exact(src, &mut encoded[i..i + 1])?;
            if encoded[i] & CONTINUATION == 0 {
                let varint = Self::read(encoded[..=i].iter())?;
                return Ok((varint, encoded));
            }
        }

        Err(Error::MalformedVarint)
    }

    /// Appends the minimal encoding of the value
    pub fn write(&self, stream: &mut BytesMut) {
        let mut rest = self.value;
        loop {
            let group = (rest as u8) & GROUP;
            rest >>= 7;
            if rest == 0 {
                stream.put_u8(group);
                return;
            }

            stream.put_u8(group | CONTINUATION);
        }
    }
}

/// Fill `buf` from the reader. Running out of input is reported as
/// [Error::InsufficientData] with the number of bytes still missing.
pub fn read_exact<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<(), Error> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => return Err(Error::InsufficientData(buf.len() - filled)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Read a length-prefixed byte sequence from a byte stream.
pub fn read_mqtt_bytes(stream: &mut Bytes) -> Result<Bytes, Error> {
    let len = read_u16(stream)? as usize;

    // Ensures that reading variable len string or bytes doesn't cross
    // the boundary promised by the remaining length
    if len > stream.len() {
        return Err(Error::InsufficientData(len - stream.len()));
    }

    Ok(stream.split_to(len))
}

/// Read a length-prefixed UTF-8 string from a byte stream.
pub fn read_mqtt_string(stream: &mut Bytes) -> Result<String, Error> {
    let s = read_mqtt_bytes(stream)?;
    String::from_utf8(s.to_vec()).map_err(|e| Violation::Utf8Encoding(e.utf8_error()).into())
}

/// Write a length-prefixed byte sequence to a byte stream.
///
/// # Errors
/// Sequences longer than 65535 bytes can't be length-prefixed
pub fn write_mqtt_bytes(stream: &mut BytesMut, bytes: &[u8]) -> Result<(), Error> {
    if bytes.len() > MAX_STRING_LENGTH {
        return Err(Error::ValueOutOfRange {
            value: bytes.len(),
            max: MAX_STRING_LENGTH,
        });
    }

    stream.put_u16(bytes.len() as u16);
    stream.extend_from_slice(bytes);
    Ok(())
}

/// Write a length-prefixed UTF-8 string to a byte stream.
pub fn write_mqtt_string(stream: &mut BytesMut, string: &str) -> Result<(), Error> {
    write_mqtt_bytes(stream, string.as_bytes())
}

/// A checked version of [`bytes::Buf::get_u8`]
pub fn read_u8(stream: &mut Bytes) -> Result<u8, Error> {
    if stream.is_empty() {
        return Err(Error::InsufficientData(1));
    }

    Ok(stream.get_u8())
}

/// A checked version of [`bytes::Buf::get_u16`]
pub fn read_u16(stream: &mut Bytes) -> Result<u16, Error> {
    if stream.len() < 2 {
        return Err(Error::InsufficientData(2 - stream.len()));
    }

    Ok(stream.get_u16())
}
