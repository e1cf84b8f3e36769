use bytes::{BufMut, Bytes, BytesMut};

use super::{ControlPacket, PacketType};
use crate::parse::*;
use crate::{Error, FixedHeader};

/// Publish complete
///
/// Response to a PUBREL packet. It is the fourth and final packet of the QoS 2 protocol exchange.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PubComp {
    pub pkid: u16,
}

impl PubComp {
    pub fn new(pkid: u16) -> Self {
        Self { pkid }
    }
}

impl ControlPacket for PubComp {
    const PACKET_TYPE: PacketType = PacketType::PubComp;

    fn remaining_len(&self) -> usize {
        2 // pkid
    }

    fn read_body(_fixed_header: FixedHeader, bytes: &mut Bytes) -> Result<Self, Error> {
        let pkid = read_u16(bytes)?;
        Ok(PubComp::new(pkid))
    }

    fn write_body(&self, buffer: &mut BytesMut) -> Result<(), Error> {
        buffer.put_u16(self.pkid);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn pubcomp_parsing_works() {
        let mut src = Cursor::new(vec![0x70, 0x02, 0x00, 0x2A]);
        let (pubcomp, _) = PubComp::decode(&mut src).unwrap();
        assert_eq!(pubcomp, PubComp::new(42));
    }

    #[test]
    fn pubcomp_short_body_rejected() {
        let mut src = Cursor::new(vec![0x70, 0x01, 0x00]);
        assert!(matches!(
            PubComp::decode(&mut src),
            Err(Error::SizeMismatch {
                declared: 1,
                actual: 2
            })
        ));
    }
}
