use core::fmt;

use crate::{
    buffer::BufferProvider,
    eio::Read,
    header::FixedHeader,
    io::{
        err::{BodyReadError, ReadError},
        read::BodyReader,
    },
    packet::Packet,
    v5::property::AtMostOncePropertyError,
};

/// A packet that can be decoded from the wire.
pub trait RxPacket<'p>: Packet + Sized {
    /// Receives the packet body. Must check the fixed header's flags.
    async fn receive<R: Read, B: BufferProvider<'p>>(
        header: &FixedHeader,
        reader: BodyReader<'_, 'p, R, B>,
    ) -> Result<Self, RxError<R::Error, B::ProvisionError>>;
}

/// Errors returned while decoding a packet.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxError<E, B> {
    /// The underlying Read failed.
    Read(E),
    /// A buffer provision failed.
    Buffer(B),
    /// The underlying Read reported end of stream mid-packet.
    UnexpectedEOF,
    /// The packet does not follow the encoding rules.
    MalformedPacket,
    /// The packet is well-formed but violates the protocol.
    ProtocolError,
}

impl<E, B: fmt::Debug> From<BodyReadError<E, B>> for RxError<E, B> {
    fn from(e: BodyReadError<E, B>) -> Self {
        match e {
            BodyReadError::Read(e) => Self::Read(e),
            BodyReadError::Buffer(b) => Self::Buffer(b),
            BodyReadError::UnexpectedEOF => Self::UnexpectedEOF,
            BodyReadError::InsufficientRemainingLen => Self::MalformedPacket,
            BodyReadError::MalformedPacket => Self::MalformedPacket,
            BodyReadError::ProtocolError => Self::ProtocolError,
        }
    }
}
impl<E, B: fmt::Debug> From<ReadError<BodyReadError<E, B>>> for RxError<E, B> {
    fn from(e: ReadError<BodyReadError<E, B>>) -> Self {
        match e {
            ReadError::Read(e) => e.into(),
            ReadError::UnexpectedEOF => Self::UnexpectedEOF,
            ReadError::MalformedPacket => Self::MalformedPacket,
            ReadError::ProtocolError => Self::ProtocolError,
        }
    }
}
impl<E, B: fmt::Debug> From<AtMostOncePropertyError<ReadError<BodyReadError<E, B>>>>
    for RxError<E, B>
{
    fn from(e: AtMostOncePropertyError<ReadError<BodyReadError<E, B>>>) -> Self {
        match e {
            AtMostOncePropertyError::Read(e) => e.into(),
            AtMostOncePropertyError::AlreadySet => Self::ProtocolError,
        }
    }
}
