use std::io::{self, Read, Write};

use crate::parse::{read_exact, VarInt};
use crate::{Error, FixedHeader};

/// Copies one packet from `src` to `dst` without decoding it.
///
/// Only the fixed header is interpreted, to learn how many bytes make up the
/// packet. Everything, including the remaining length in whatever encoding it
/// arrived in, is written to `dst` unmodified. Returns the number of bytes copied.
///
/// On error, whatever was already written to `dst` is not a valid packet.
pub fn copy_packet<W: Write, R: Read>(dst: &mut W, src: &mut R) -> Result<usize, Error> {
    let mut byte1 = [0u8; 1];
    read_exact(src, &mut byte1)?;
    dst.write_all(&byte1)?;

    let (remaining_len, encoded) = VarInt::read_from(src)?;
    dst.write_all(&encoded[..remaining_len.length()])?;

    let expected = remaining_len.value() as u64;
    let copied = io::copy(&mut src.take(expected), dst)?;
    if copied < expected {
        return Err(Error::InsufficientData((expected - copied) as usize));
    }

    let fixed_header = FixedHeader::new(byte1[0], remaining_len);
    log::trace!("Copied packet. {fixed_header}");

    Ok(fixed_header.packet_size())
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{ControlPacket, Packet, Publish, QoS};

    #[test]
    fn copies_one_packet_at_a_time() {
        let stream = vec![
            0x40, 0x02, 0x00, 0x0A, // puback
            0x30, 0x05, 0x00, 0x01, b'a', 0xCA, 0xFE, // publish
            0xC0, 0x00, // pingreq
        ];
        let mut src = Cursor::new(stream.clone());
        let mut dst = Vec::new();

        assert_eq!(copy_packet(&mut dst, &mut src).unwrap(), 4);
        assert_eq!(dst, &stream[..4]);
        assert_eq!(copy_packet(&mut dst, &mut src).unwrap(), 7);
        assert_eq!(copy_packet(&mut dst, &mut src).unwrap(), 2);
        assert_eq!(dst, stream);

        assert!(matches!(
            copy_packet(&mut dst, &mut src),
            Err(Error::InsufficientData(1))
        ));
    }

    #[test]
    fn copied_packet_decodes() {
        let mut publish = Publish::new("a/b", QoS::AtLeastOnce, vec![0u8; 200]).unwrap();
        publish.pkid = 9;
        let bytes = publish.encode().unwrap();

        let mut dst = Vec::new();
        let n = copy_packet(&mut dst, &mut Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(n, bytes.len());

        let (packet, _) = Packet::decode(&mut Cursor::new(dst), None).unwrap();
        assert_eq!(packet, Packet::Publish(publish));
    }

    #[test]
    fn non_minimal_remaining_length_is_kept() {
        // PINGREQ with remaining length 0 encoded in two bytes
        let stream = vec![0xC0, 0x80, 0x00];
        let mut dst = Vec::new();

        assert_eq!(copy_packet(&mut dst, &mut Cursor::new(stream.clone())).unwrap(), 3);
        assert_eq!(dst, stream);
    }

    #[test]
    fn truncated_packet_is_reported() {
        let stream = vec![0x30, 0x05, 0x00, 0x01, b'a'];
        let mut dst = Vec::new();

        assert!(matches!(
            copy_packet(&mut dst, &mut Cursor::new(stream)),
            Err(Error::InsufficientData(2))
        ));
    }

    #[test]
    fn malformed_remaining_length_is_reported() {
        let stream = vec![0x30, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        let mut dst = Vec::new();

        assert!(matches!(
            copy_packet(&mut dst, &mut Cursor::new(stream)),
            Err(Error::MalformedVarint)
        ));
    }
}
