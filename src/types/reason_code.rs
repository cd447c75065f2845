use crate::{
    eio::{Read, Write},
    io::{
        err::{ReadError, WriteError},
        read::Readable,
        write::Writable,
    },
};

/// A Reason Code indicates the result of an operation in the variable header
/// of an acknowledgement or DISCONNECT packet.
///
/// This crate only models the codes that can appear on the inbound QoS path:
/// the PUBACK/PUBREC family, the PUBREL/PUBCOMP pair and the client-originated
/// DISCONNECT causes. Decoding any other code is treated as a protocol error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReasonCode {
    /// PUBACK, PUBREC, PUBREL, PUBCOMP, DISCONNECT
    #[default]
    Success,

    /// PUBACK, PUBREC
    NoMatchingSubscribers,

    /// PUBACK, PUBREC, DISCONNECT
    UnspecifiedError,

    /// DISCONNECT
    MalformedPacket,

    /// DISCONNECT
    ProtocolError,

    /// PUBACK, PUBREC, DISCONNECT
    ImplementationSpecificError,

    /// PUBACK, PUBREC, DISCONNECT
    NotAuthorized,

    /// PUBACK, PUBREC, DISCONNECT
    TopicNameInvalid,

    /// PUBACK, PUBREC
    PacketIdentifierInUse,

    /// PUBREL, PUBCOMP
    PacketIdentifierNotFound,

    /// DISCONNECT
    ReceiveMaximumExceeded,

    /// DISCONNECT
    TopicAliasInvalid,

    /// DISCONNECT
    PacketTooLarge,

    /// PUBACK, PUBREC, DISCONNECT
    QuotaExceeded,

    /// PUBACK, PUBREC, DISCONNECT
    PayloadFormatInvalid,
}

impl ReasonCode {
    /// Returns the numeric value of the reason code.
    pub const fn value(&self) -> u8 {
        match self {
            Self::Success => 0x00,
            Self::NoMatchingSubscribers => 0x10,
            Self::UnspecifiedError => 0x80,
            Self::MalformedPacket => 0x81,
            Self::ProtocolError => 0x82,
            Self::ImplementationSpecificError => 0x83,
            Self::NotAuthorized => 0x87,
            Self::TopicNameInvalid => 0x90,
            Self::PacketIdentifierInUse => 0x91,
            Self::PacketIdentifierNotFound => 0x92,
            Self::ReceiveMaximumExceeded => 0x93,
            Self::TopicAliasInvalid => 0x94,
            Self::PacketTooLarge => 0x95,
            Self::QuotaExceeded => 0x97,
            Self::PayloadFormatInvalid => 0x99,
        }
    }

    /// Returns whether the reason code is successful (numeric value below
    /// 0x80).
    pub const fn is_success(&self) -> bool {
        self.value() < 0x80
    }

    /// Returns whether the reason code indicates an error (numeric value of
    /// 0x80 or above).
    pub const fn is_erroneous(&self) -> bool {
        self.value() >= 0x80
    }
}

impl<R: Read> Readable<R> for ReasonCode {
    async fn read(read: &mut R) -> Result<Self, ReadError<R::Error>> {
        Ok(match u8::read(read).await? {
            0x00 => Self::Success,
            0x10 => Self::NoMatchingSubscribers,
            0x80 => Self::UnspecifiedError,
            0x81 => Self::MalformedPacket,
            0x82 => Self::ProtocolError,
            0x83 => Self::ImplementationSpecificError,
            0x87 => Self::NotAuthorized,
            0x90 => Self::TopicNameInvalid,
            0x91 => Self::PacketIdentifierInUse,
            0x92 => Self::PacketIdentifierNotFound,
            0x93 => Self::ReceiveMaximumExceeded,
            0x94 => Self::TopicAliasInvalid,
            0x95 => Self::PacketTooLarge,
            0x97 => Self::QuotaExceeded,
            0x99 => Self::PayloadFormatInvalid,
            _ => return Err(ReadError::ProtocolError),
        })
    }
}

impl Writable for ReasonCode {
    fn written_len(&self) -> usize {
        1
    }

    async fn write<W: Write>(&self, write: &mut W) -> Result<(), WriteError<W::Error>> {
        self.value().write(write).await
    }
}
