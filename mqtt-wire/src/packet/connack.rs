use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use super::{ControlPacket, PacketType};
use crate::header::fmt_header;
use crate::parse::*;
use crate::{Error, FixedHeader, Violation};

/// Connect acknowledgment
///
/// Packet sent by the server in response to a CONNECT packet received from a client.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnAck {
    pub session_present: bool,
    pub code: ConnectReturnCode,
}

/// MQTT 3.1.1 return codes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectReturnCode {
    /// Connection accepted
    #[default]
    Success = 0,
    /// The Server does not support the level of the MQTT protocol requested by the Client
    RefusedProtocolVersion,
    /// The Client identifier is correct UTF-8 but not allowed by the Server
    BadClientId,
    /// The Network Connection has been made but the MQTT service is unavailable
    ServiceUnavailable,
    /// The data in the user name or password is malformed
    BadUserNamePassword,
    /// The Client is not authorized to connect
    NotAuthorized,
}

impl ConnectReturnCode {
    /// Whether `code` is one of the return codes defined by the protocol
    pub const fn is_valid(code: u8) -> bool {
        code <= ConnectReturnCode::NotAuthorized as u8
    }

    /// Human-readable response text
    pub const fn response(&self) -> &'static str {
        match self {
            ConnectReturnCode::Success => "Connection Accepted",
            ConnectReturnCode::RefusedProtocolVersion => {
                "Connection Refused, unacceptable protocol version"
            }
            ConnectReturnCode::BadClientId => "Connection Refused, identifier rejected",
            ConnectReturnCode::ServiceUnavailable => "Connection Refused, Server unavailable",
            ConnectReturnCode::BadUserNamePassword => {
                "Connection Refused, bad user name or password"
            }
            ConnectReturnCode::NotAuthorized => "Connection Refused, not authorized",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            ConnectReturnCode::Success => "Connection accepted",
            ConnectReturnCode::RefusedProtocolVersion => {
                "The Server does not support the level of the MQTT protocol requested by the Client"
            }
            ConnectReturnCode::BadClientId => {
                "The Client identifier is correct UTF-8 but not allowed by the Server"
            }
            ConnectReturnCode::ServiceUnavailable => {
                "The Network Connection has been made but the MQTT service is unavailable"
            }
            ConnectReturnCode::BadUserNamePassword => {
                "The data in the user name or password is malformed"
            }
            ConnectReturnCode::NotAuthorized => "The Client is not authorized to connect",
        }
    }
}

impl fmt::Display for ConnectReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.response())
    }
}

impl TryFrom<u8> for ConnectReturnCode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ConnectReturnCode::Success,
            1 => ConnectReturnCode::RefusedProtocolVersion,
            2 => ConnectReturnCode::BadClientId,
            3 => ConnectReturnCode::ServiceUnavailable,
            4 => ConnectReturnCode::BadUserNamePassword,
            5 => ConnectReturnCode::NotAuthorized,
            num => return Err(Violation::InvalidConnectReturnCode(num).into()),
        };

        Ok(code)
    }
}

impl ConnAck {
    /// Create a new ConnAck packet accepting the connection
    pub fn new(session_present: bool) -> Self {
        Self {
            session_present,
            code: ConnectReturnCode::Success,
        }
    }

    /// Create a new ConnAck packet from a [ConnectReturnCode]
    pub fn from_return_code(code: ConnectReturnCode, session_present: bool) -> Self {
        Self {
            session_present,
            code,
        }
    }
}

impl ControlPacket for ConnAck {
    const PACKET_TYPE: PacketType = PacketType::ConnAck;

    fn remaining_len(&self) -> usize {
        // session present + code
        1 + 1
    }

    fn read_body(_fixed_header: FixedHeader, bytes: &mut Bytes) -> Result<Self, Error> {
        let flags = read_u8(bytes)?;
        // only bit 0 of the acknowledge flags is in use
        if flags & 0b1111_1110 != 0 {
            return Err(Violation::ReservedBitsSet(flags).into());
        }

        let code = ConnectReturnCode::try_from(read_u8(bytes)?)?;
        Ok(ConnAck {
            session_present: flags == 1,
            code,
        })
    }

    fn write_body(&self, buffer: &mut BytesMut) -> Result<(), Error> {
        // connect acknowledge flags
        buffer.put_u8(self.session_present as u8);
        // return code
        buffer.put_u8(self.code as u8);
        Ok(())
    }
}

impl fmt::Display for ConnAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_header(f, Self::PACKET_TYPE, self.flags(), self.remaining_len())?;
        write!(
            f,
            "\nSession Present: {}\nReturn Code: {}",
            self.session_present, self.code
        )
    }
}
