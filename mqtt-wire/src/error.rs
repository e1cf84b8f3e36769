use crate::{ConnectReturnCode, PacketType};

/// Error during serialization or deserialization
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// More bytes required to frame packet. Argument
    /// implies minimum additional bytes required to
    /// proceed further
    #[error("Insufficient number of bytes to frame packet, {0} more bytes required")]
    InsufficientData(usize),
    #[error("Remaining length is malformed, 4th byte has continuation bit set")]
    MalformedVarint,
    #[error("Invalid packet type = {found}, expected {expected:?}")]
    InvalidPacketType {
        found: u8,
        expected: Option<PacketType>,
    },
    #[error("Invalid flags {flags:#06b} for {packet_type:?} packet")]
    InvalidFlags { packet_type: PacketType, flags: u8 },
    #[error("Remaining length is {declared} bytes but body needs {actual} bytes")]
    SizeMismatch { declared: usize, actual: usize },
    #[error("Protocol violation: {0}")]
    ProtocolViolation(#[from] Violation),
    #[error("Value {value} out of range, maximum is {max}")]
    ValueOutOfRange { value: usize, max: usize },
    #[error("Packet of {size} bytes exceeds the maximum packet size of {max} bytes")]
    PacketTooLarge { size: usize, max: u32 },
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

/// Field level rule of the protocol broken by a packet
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("Invalid QoS level = {0}")]
    InvalidQoS(u8),
    #[error("Invalid topic name {0:?}, must not be empty or contain wildcard characters")]
    InvalidTopic(String),
    #[error("Payload is required")]
    EmptyPayload,
    #[error("Unacceptable protocol version")]
    UnacceptableProtocolVersion,
    #[error("Client identifier rejected")]
    IdentifierRejected,
    #[error("Invalid return code received as response for connect = {0}")]
    InvalidConnectReturnCode(u8),
    #[error("Invalid subscribe return code = {0}")]
    InvalidSubscribeReturnCode(u8),
    #[error("Reserved bits are set = {0:#010b}")]
    ReservedBitsSet(u8),
    #[error("Will QoS and will retain must be zero when the will flag is not set")]
    WillFlagsWithoutWill,
    #[error("Password flag is set but username flag is not set")]
    PasswordWithoutUsername,
    #[error("Empty topic filter list")]
    EmptyFilterList,
    #[error("String is not UTF-8 encoded = {0}")]
    Utf8Encoding(#[from] std::str::Utf8Error),
}

impl Violation {
    /// The CONNACK return code a server answers with when a CONNECT breaks this rule
    pub fn connect_return_code(&self) -> Option<ConnectReturnCode> {
        match self {
            Violation::UnacceptableProtocolVersion => {
                Some(ConnectReturnCode::RefusedProtocolVersion)
            }
            Violation::IdentifierRejected => Some(ConnectReturnCode::BadClientId),
            _ => None,
        }
    }
}
